//! The component entity graph.
//!
//! A [`Component`] owns its subcomponents by value, so a component graph is
//! always a tree. Interface delegation only ever points downward into that
//! tree, which means resolving a delegated interface always terminates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::capability::HasCapabilities;
use crate::core::composable::Composable;
use crate::core::interface::{Connection, Endpoint, InterfaceSpec, PortType};
use crate::core::parameter::ParamValue;

/// Errors raised while assembling a component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("component `{component}` has no interface `{interface}`")]
    UnknownInterface { component: String, interface: String },

    #[error("component `{component}` has no subcomponent `{subcomponent}`")]
    UnknownSubcomponent {
        component: String,
        subcomponent: String,
    },

    #[error("component `{component}` has no parameter `{parameter}`")]
    UnknownParameter { component: String, parameter: String },

    #[error("component `{component}` already has a subcomponent named `{subcomponent}`")]
    DuplicateSubcomponent {
        component: String,
        subcomponent: String,
    },

    #[error("cannot connect `{from}` ({from_type}) to `{to}` ({to_type}): port types differ")]
    PortTypeMismatch {
        from: String,
        from_type: String,
        to: String,
        to_type: String,
    },
}

/// A component embedded in another, with its wiring metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcomponent {
    pub component: Component,

    /// Parameters of the embedded component pinned by the parent
    #[serde(default)]
    pub bindings: BTreeMap<String, ParamValue>,
}

/// A named, composable unit with interfaces, parameters and composables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    name: String,
    #[serde(default)]
    interfaces: BTreeMap<String, InterfaceSpec>,
    #[serde(default)]
    parameters: BTreeMap<String, ParamValue>,
    #[serde(default)]
    composables: BTreeMap<String, Composable>,
    #[serde(default)]
    subcomponents: BTreeMap<String, Subcomponent>,
    #[serde(default)]
    connections: Vec<Connection>,
}

impl Component {
    /// Create an empty component.
    pub fn new(name: impl Into<String>) -> Self {
        Component {
            name: name.into(),
            interfaces: BTreeMap::new(),
            parameters: BTreeMap::new(),
            composables: BTreeMap::new(),
            subcomponents: BTreeMap::new(),
            connections: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the component.
    ///
    /// Method bindings owned by the old name follow the rename.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name == self.name {
            return;
        }
        for composable in self.composables.values_mut() {
            composable.rebind_owner(&self.name, &name);
        }
        self.name = name;
    }

    pub fn interfaces(&self) -> &BTreeMap<String, InterfaceSpec> {
        &self.interfaces
    }

    pub fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.parameters
    }

    pub fn composables(&self) -> &BTreeMap<String, Composable> {
        &self.composables
    }

    pub fn subcomponents(&self) -> &BTreeMap<String, Subcomponent> {
        &self.subcomponents
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Get a parameter's current value.
    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Declare a direct interface (or replace an existing entry).
    pub fn add_interface(&mut self, name: impl Into<String>, spec: InterfaceSpec) {
        self.interfaces.insert(name.into(), spec);
    }

    /// Declare a parameter with its default value.
    pub fn add_parameter(&mut self, name: impl Into<String>, default: impl Into<ParamValue>) {
        self.parameters.insert(name.into(), default.into());
    }

    /// Set a parameter, declaring it if it does not exist yet.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.parameters.insert(name.into(), value.into());
    }

    /// Attach a composable under `key`.
    pub fn add_composable(&mut self, key: impl Into<String>, composable: Composable) {
        self.composables.insert(key.into(), composable);
    }

    /// Embed `component` under `name`.
    pub fn add_subcomponent(
        &mut self,
        name: impl Into<String>,
        component: Component,
    ) -> Result<(), ModelError> {
        let name = name.into();
        if self.subcomponents.contains_key(&name) {
            return Err(ModelError::DuplicateSubcomponent {
                component: self.name.clone(),
                subcomponent: name,
            });
        }
        self.subcomponents.insert(
            name,
            Subcomponent {
                component,
                bindings: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Expose `interface` of subcomponent `subcomponent` as `name` on this
    /// component.
    ///
    /// The delegated interface must exist and resolve on the subcomponent.
    pub fn inherit_interface(
        &mut self,
        name: impl Into<String>,
        subcomponent: &str,
        interface: &str,
    ) -> Result<(), ModelError> {
        let sub = self.subcomponent(subcomponent)?;
        sub.component.resolve_interface(interface)?;
        self.interfaces
            .insert(name.into(), InterfaceSpec::delegate(subcomponent, interface));
        Ok(())
    }

    /// Wire two subcomponent interfaces together.
    ///
    /// Both endpoints must resolve and carry the same port type.
    pub fn add_connection(&mut self, from: Endpoint, to: Endpoint) -> Result<(), ModelError> {
        let from_type = self.resolve_endpoint(&from)?;
        let to_type = self.resolve_endpoint(&to)?;
        if from_type != to_type {
            return Err(ModelError::PortTypeMismatch {
                from: from.to_string(),
                from_type: from_type.to_string(),
                to: to.to_string(),
                to_type: to_type.to_string(),
            });
        }
        self.connections.push(Connection { from, to });
        Ok(())
    }

    /// Pin a parameter of a subcomponent to a fixed value.
    pub fn constrain_parameter(
        &mut self,
        subcomponent: &str,
        parameter: &str,
        value: impl Into<ParamValue>,
    ) -> Result<(), ModelError> {
        let component_name = self.name.clone();
        let sub = self
            .subcomponents
            .get_mut(subcomponent)
            .ok_or_else(|| ModelError::UnknownSubcomponent {
                component: component_name,
                subcomponent: subcomponent.to_string(),
            })?;
        if !sub.component.parameters.contains_key(parameter) {
            return Err(ModelError::UnknownParameter {
                component: sub.component.name.clone(),
                parameter: parameter.to_string(),
            });
        }
        let value = value.into();
        sub.component.set_parameter(parameter, value.clone());
        sub.bindings.insert(parameter.to_string(), value);
        Ok(())
    }

    /// Resolve the effective port type of interface `name`.
    ///
    /// Delegation records are followed into subcomponents until a direct
    /// port is reached.
    pub fn resolve_interface(&self, name: &str) -> Result<&PortType, ModelError> {
        let mut current = self;
        let mut interface = name;
        loop {
            let spec = current
                .interfaces
                .get(interface)
                .ok_or_else(|| ModelError::UnknownInterface {
                    component: current.name.clone(),
                    interface: interface.to_string(),
                })?;
            match spec {
                InterfaceSpec::Port { port_type } => return Ok(port_type),
                InterfaceSpec::Delegate {
                    subcomponent,
                    interface: inner,
                } => {
                    current = &current.subcomponent(subcomponent)?.component;
                    interface = inner;
                }
            }
        }
    }

    fn subcomponent(&self, name: &str) -> Result<&Subcomponent, ModelError> {
        self.subcomponents
            .get(name)
            .ok_or_else(|| ModelError::UnknownSubcomponent {
                component: self.name.clone(),
                subcomponent: name.to_string(),
            })
    }

    fn resolve_endpoint(&self, endpoint: &Endpoint) -> Result<PortType, ModelError> {
        let sub = self.subcomponent(&endpoint.subcomponent)?;
        sub.component
            .resolve_interface(&endpoint.interface)
            .cloned()
    }
}

impl HasCapabilities for Component {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_composable(&self, key: &str) -> bool {
        self.composables.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn servo() -> Component {
        let mut c = Component::new("Servo");
        c.add_parameter("angle", 90);
        c.add_interface("horn", InterfaceSpec::port(PortType::shaft()));
        c.add_interface("signal", InterfaceSpec::port(PortType::data()));
        c
    }

    #[test]
    fn test_has_capability() {
        let mut c = Component::new("Motor");
        c.add_composable("code", Composable::code("arduino"));

        assert!(c.has_capability("code"));
        assert!(c.has_capability("all"));
        assert!(!c.has_capability("graph"));
    }

    #[test]
    fn test_resolve_delegated_interface() {
        let mut mount = Component::new("ServoMount");
        mount.add_subcomponent("servo", servo()).unwrap();
        mount.inherit_interface("horn", "servo", "horn").unwrap();

        assert_eq!(mount.resolve_interface("horn").unwrap(), &PortType::shaft());
    }

    #[test]
    fn test_resolve_nested_delegation() {
        let mut mount = Component::new("ServoMount");
        mount.add_subcomponent("servo", servo()).unwrap();
        mount.inherit_interface("output", "servo", "horn").unwrap();

        let mut arm = Component::new("Arm");
        arm.add_subcomponent("base", mount).unwrap();
        arm.inherit_interface("shoulder", "base", "output").unwrap();

        assert_eq!(arm.resolve_interface("shoulder").unwrap().as_str(), "ShaftPort");
    }

    #[test]
    fn test_inherit_unknown_interface_fails() {
        let mut mount = Component::new("ServoMount");
        mount.add_subcomponent("servo", servo()).unwrap();

        let err = mount.inherit_interface("x", "servo", "missing").unwrap_err();
        assert!(matches!(err, ModelError::UnknownInterface { .. }));

        let err = mount.inherit_interface("x", "nope", "horn").unwrap_err();
        assert!(matches!(err, ModelError::UnknownSubcomponent { .. }));
    }

    #[test]
    fn test_dangling_delegate_does_not_resolve() {
        let mut c = Component::new("Broken");
        c.add_interface("x", InterfaceSpec::delegate("ghost", "x"));

        assert!(matches!(
            c.resolve_interface("x"),
            Err(ModelError::UnknownSubcomponent { .. })
        ));
    }

    #[test]
    fn test_add_connection_checks_types() {
        let mut brain = Component::new("Brain");
        brain.add_interface("pwm", InterfaceSpec::port(PortType::data()));

        let mut robot = Component::new("Robot");
        robot.add_subcomponent("servo", servo()).unwrap();
        robot.add_subcomponent("brain", brain).unwrap();

        robot
            .add_connection(Endpoint::new("brain", "pwm"), Endpoint::new("servo", "signal"))
            .unwrap();
        assert_eq!(robot.connections().len(), 1);

        let err = robot
            .add_connection(Endpoint::new("brain", "pwm"), Endpoint::new("servo", "horn"))
            .unwrap_err();
        assert!(matches!(err, ModelError::PortTypeMismatch { .. }));
    }

    #[test]
    fn test_constrain_parameter() {
        let mut mount = Component::new("ServoMount");
        mount.add_subcomponent("servo", servo()).unwrap();
        mount.constrain_parameter("servo", "angle", 45).unwrap();

        let sub = &mount.subcomponents()["servo"];
        assert_eq!(sub.component.parameter("angle"), Some(&ParamValue::Int(45)));
        assert_eq!(sub.bindings["angle"], ParamValue::Int(45));

        assert!(mount.constrain_parameter("servo", "speed", 1).is_err());
    }

    #[test]
    fn test_duplicate_subcomponent() {
        let mut mount = Component::new("ServoMount");
        mount.add_subcomponent("servo", servo()).unwrap();
        assert!(matches!(
            mount.add_subcomponent("servo", servo()),
            Err(ModelError::DuplicateSubcomponent { .. })
        ));
    }

    #[test]
    fn test_set_name_rebinds_methods() {
        let mut c = Component::new("Motor");
        c.add_composable(
            "code",
            Composable::code("arduino").with_binding("on_drive", "Motor", "drive"),
        );
        c.set_name("LeftMotor");

        assert_eq!(c.name(), "LeftMotor");
        match &c.composables()["code"] {
            Composable::CodeComposable { bindings, .. } => {
                assert_eq!(bindings["on_drive"].owner, "LeftMotor")
            }
            _ => unreachable!(),
        }
    }
}

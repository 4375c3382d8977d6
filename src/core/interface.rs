//! Interfaces - typed connection points on a component.
//!
//! An interface is either declared directly with a port type, or delegated
//! to an interface of one of the component's subcomponents.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The type tag of a port.
///
/// Port types are identified by name, not by shape: two ports are the same
/// type iff their tags are equal. The well-known tags have constructors;
/// anything else is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortType(String);

impl PortType {
    pub const EDGE: &'static str = "EdgePort";
    pub const FACE: &'static str = "FacePort";
    pub const DATA: &'static str = "DataPort";
    pub const ELECTRICAL: &'static str = "ElectricalPort";
    pub const MOUNT: &'static str = "MountPort";
    pub const SHAFT: &'static str = "ShaftPort";

    /// Create a port type from any tag.
    pub fn new(tag: impl Into<String>) -> Self {
        PortType(tag.into())
    }

    pub fn edge() -> Self {
        Self::new(Self::EDGE)
    }

    pub fn face() -> Self {
        Self::new(Self::FACE)
    }

    pub fn data() -> Self {
        Self::new(Self::DATA)
    }

    pub fn electrical() -> Self {
        Self::new(Self::ELECTRICAL)
    }

    pub fn mount() -> Self {
        Self::new(Self::MOUNT)
    }

    pub fn shaft() -> Self {
        Self::new(Self::SHAFT)
    }

    /// The tag as stored in the relational index.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PortType {
    fn from(tag: &str) -> Self {
        PortType::new(tag)
    }
}

/// An entry in a component's interface map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterfaceSpec {
    /// Declared directly on this component.
    Port { port_type: PortType },

    /// Forwarded to `interface` on the subcomponent named `subcomponent`.
    Delegate {
        subcomponent: String,
        interface: String,
    },
}

impl InterfaceSpec {
    /// A direct port of the given type.
    pub fn port(port_type: impl Into<PortType>) -> Self {
        InterfaceSpec::Port {
            port_type: port_type.into(),
        }
    }

    /// A delegation record.
    pub fn delegate(subcomponent: impl Into<String>, interface: impl Into<String>) -> Self {
        InterfaceSpec::Delegate {
            subcomponent: subcomponent.into(),
            interface: interface.into(),
        }
    }

    /// Check if this entry forwards to a subcomponent.
    pub fn is_delegate(&self) -> bool {
        matches!(self, InterfaceSpec::Delegate { .. })
    }
}

/// One endpoint of a connection: an interface on a subcomponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub subcomponent: String,
    pub interface: String,
}

impl Endpoint {
    pub fn new(subcomponent: impl Into<String>, interface: impl Into<String>) -> Self {
        Endpoint {
            subcomponent: subcomponent.into(),
            interface: interface.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.subcomponent, self.interface)
    }
}

/// Wiring between two subcomponent interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: Endpoint,
    pub to: Endpoint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_type_equality_is_by_tag() {
        assert_eq!(PortType::edge(), PortType::from("EdgePort"));
        assert_ne!(PortType::edge(), PortType::face());
        assert_eq!(PortType::new("CustomPort").as_str(), "CustomPort");
    }

    #[test]
    fn test_interface_spec_serde_tag() {
        let spec = InterfaceSpec::delegate("servo", "horn");
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"kind\":\"delegate\""));

        let back: InterfaceSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
        assert!(back.is_delegate());
    }
}

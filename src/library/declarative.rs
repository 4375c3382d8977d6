//! Declarative component files.
//!
//! One TOML file per component; the file stem is the registry name.
//!
//! ```toml
//! name = "Wheel"
//!
//! [parameters]
//! radius = 30
//!
//! [interfaces]
//! hub = "MountPort"
//! drive = { subcomponent = "motor", interface = "shaft" }
//!
//! [composables.graph]
//! type = "GraphComposable"
//! faces = ["rim"]
//!
//! [subcomponents.motor]
//! component = "Motor"
//! bindings = { voltage = 6 }
//! ```
//!
//! Connections between subcomponents are listed as
//! `[[connections]]` tables with `from = "sub.interface"` and
//! `to = "sub.interface"`.
//!
//! Files are read at discovery but only parsed when instantiated, so one
//! malformed file never prevents the rest of the library from loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::registry::{BuildContext, ComponentDefinition, DefinitionOrigin};
use crate::core::{Component, Composable, Endpoint, FactoryError, InterfaceSpec, ParamValue};
use crate::util::diagnostic::DefinitionParseError;
use crate::util::fs::{glob_files, read_to_string};

/// On-disk shape of a component file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ComponentFile {
    name: Option<String>,
    #[serde(default)]
    parameters: BTreeMap<String, ParamValue>,
    #[serde(default)]
    interfaces: BTreeMap<String, InterfaceEntry>,
    #[serde(default)]
    composables: BTreeMap<String, Composable>,
    #[serde(default)]
    subcomponents: BTreeMap<String, SubcomponentEntry>,
    #[serde(default)]
    connections: Vec<ConnectionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InterfaceEntry {
    Port(String),
    Delegate {
        subcomponent: String,
        interface: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubcomponentEntry {
    component: String,
    #[serde(default)]
    bindings: BTreeMap<String, ParamValue>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConnectionEntry {
    from: String,
    to: String,
}

/// A definition backed by a TOML file.
#[derive(Debug, Clone)]
pub struct DeclarativeDefinition {
    name: String,
    path: PathBuf,
    source: String,
}

impl DeclarativeDefinition {
    /// Read a component file. The file stem becomes the definition name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("invalid component file name: {}", path.display()))?
            .to_string();
        let source = read_to_string(path)?;
        Ok(DeclarativeDefinition {
            name,
            path: path.to_path_buf(),
            source,
        })
    }

    /// Create a definition from in-memory source.
    pub fn from_source(name: impl Into<String>, path: PathBuf, source: impl Into<String>) -> Self {
        DeclarativeDefinition {
            name: name.into(),
            path,
            source: source.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the file without building it, reporting the failing span.
    pub fn validate(&self) -> Result<(), DefinitionParseError> {
        match toml::from_str::<ComponentFile>(&self.source) {
            Ok(_) => Ok(()),
            Err(e) => Err(DefinitionParseError {
                name: self.name.clone(),
                src: miette::NamedSource::new(
                    self.path.display().to_string(),
                    self.source.clone(),
                ),
                span: e.span().map(Into::into),
                message: e.message().to_string(),
            }),
        }
    }

    fn invalid(&self, message: impl Into<String>) -> FactoryError {
        FactoryError::InvalidDefinition {
            name: self.name.clone(),
            path: self.path.clone(),
            message: message.into(),
        }
    }

    fn parse_endpoint(&self, raw: &str) -> Result<Endpoint, FactoryError> {
        match raw.split_once('.') {
            Some((sub, iface)) if !sub.is_empty() && !iface.is_empty() => {
                Ok(Endpoint::new(sub, iface))
            }
            _ => Err(self.invalid(format!(
                "connection endpoint `{}` must look like `subcomponent.interface`",
                raw
            ))),
        }
    }
}

impl ComponentDefinition for DeclarativeDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> DefinitionOrigin {
        DefinitionOrigin::Declarative(self.path.clone())
    }

    fn instantiate(&self, ctx: &mut BuildContext<'_>) -> Result<Component, FactoryError> {
        let file: ComponentFile =
            toml::from_str(&self.source).map_err(|e| self.invalid(e.to_string()))?;

        let mut component = Component::new(file.name.unwrap_or_else(|| self.name.clone()));

        for (key, value) in file.parameters {
            component.add_parameter(key, value);
        }

        for (key, entry) in file.subcomponents {
            let sub = ctx.build(&entry.component)?;
            component.add_subcomponent(key.clone(), sub)?;
            for (param, value) in entry.bindings {
                component.constrain_parameter(&key, &param, value)?;
            }
        }

        // Delegates are validated against the subcomponents added above.
        for (key, entry) in file.interfaces {
            match entry {
                InterfaceEntry::Port(port_type) => {
                    component.add_interface(key, InterfaceSpec::port(port_type.as_str()))
                }
                InterfaceEntry::Delegate {
                    subcomponent,
                    interface,
                } => component.inherit_interface(key, &subcomponent, &interface)?,
            }
        }

        for conn in file.connections {
            let from = self.parse_endpoint(&conn.from)?;
            let to = self.parse_endpoint(&conn.to)?;
            component.add_connection(from, to)?;
        }

        for (key, composable) in file.composables {
            component.add_composable(key, composable);
        }

        Ok(component)
    }
}

/// Parse every component file in `library_dir`, returning the failures.
pub fn check_library(library_dir: &Path) -> Result<Vec<DefinitionParseError>> {
    if !library_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut failures = Vec::new();
    for path in glob_files(library_dir, &["*.toml".to_string()])? {
        let def = DeclarativeDefinition::from_path(&path)?;
        if let Err(e) = def.validate() {
            failures.push(e);
        }
    }
    Ok(failures)
}

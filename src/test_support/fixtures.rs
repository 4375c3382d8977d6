//! Test fixtures for common test scenarios.
//!
//! Pre-built components and declarative library files.

use std::collections::BTreeMap;
use std::path::Path;

use crate::core::{Component, ComponentRegistry};

/// The built-in `Motor`: `voltage = 12`, `code: CodeComposable`.
pub fn motor() -> Component {
    ComponentRegistry::with_builtins()
        .instantiate("Motor")
        .expect("Motor is built in")
}

/// The built-in `ServoMount`: a composite with delegated interfaces.
pub fn servo_mount() -> Component {
    ComponentRegistry::with_builtins()
        .instantiate("ServoMount")
        .expect("ServoMount is built in")
}

/// A wheel driven by a motor, as a declarative file.
pub const WHEEL: &str = r#"
[parameters]
radius = 30

[interfaces]
hub = "MountPort"
drive = { subcomponent = "motor", interface = "shaft" }

[composables.graph]
type = "GraphComposable"
faces = ["rim"]

[subcomponents.motor]
component = "Motor"
bindings = { voltage = 6 }
"#;

/// Fixture for a directory of declarative component files.
#[derive(Debug, Clone, Default)]
pub struct LibraryFixture {
    /// Component name -> file contents.
    pub files: BTreeMap<String, String>,
}

impl LibraryFixture {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component file.
    pub fn with_component(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.files.insert(name.into(), source.into());
        self
    }

    /// Library holding the wheel.
    pub fn wheel() -> Self {
        Self::new().with_component("Wheel", WHEEL)
    }

    /// Write `<name>.toml` for every component into `dir`.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;
        for (name, source) in &self.files {
            std::fs::write(dir.join(format!("{}.toml", name)), source)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_library_fixture_discovers() {
        let tmp = TempDir::new().unwrap();
        LibraryFixture::wheel()
            .with_component("Cart", "[subcomponents.front]\ncomponent = \"Wheel\"\n")
            .write_to(tmp.path())
            .unwrap();

        let registry = ComponentRegistry::discover(tmp.path()).unwrap();
        let cart = registry.instantiate("Cart").unwrap();
        assert_eq!(cart.subcomponents()["front"].component.name(), "Wheel");
    }
}

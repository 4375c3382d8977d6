//! Component registry - named definitions the factory can instantiate.
//!
//! Definitions come from two sources: code (built into the crate) and
//! declarative TOML files in the library directory. Both implement
//! [`ComponentDefinition`]; the registry keeps them in separate tables so a
//! code definition always wins over a file of the same name.
//!
//! The registry is built once and passed by reference. Construction never
//! instantiates anything; definitions are only built on request.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::component::Component;
use crate::core::errors::{similar_names, FactoryError};
use crate::library::{builtin, declarative::DeclarativeDefinition};
use crate::util::fs::glob_files;

/// Where a definition came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionOrigin {
    Code,
    Declarative(PathBuf),
}

/// A named recipe that instantiates a component.
pub trait ComponentDefinition: Send + Sync {
    /// Registry key.
    fn name(&self) -> &str;

    /// Where the definition came from.
    fn origin(&self) -> DefinitionOrigin;

    /// Build a fresh instance.
    ///
    /// Nested components must be built through `ctx` so definition cycles
    /// are caught.
    fn instantiate(&self, ctx: &mut BuildContext<'_>) -> Result<Component, FactoryError>;
}

/// Registry of available component definitions.
#[derive(Default)]
pub struct ComponentRegistry {
    code: BTreeMap<String, Box<dyn ComponentDefinition>>,
    declarative: BTreeMap<String, Box<dyn ComponentDefinition>>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding only the built-in code definitions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for def in builtin::definitions() {
            registry.register(def);
        }
        registry
    }

    /// Built-ins plus every `*.toml` file in `library_dir`.
    ///
    /// A missing library directory is not an error. A file that cannot be
    /// read is skipped with a warning; parse errors surface when the
    /// definition is instantiated.
    pub fn discover(library_dir: &Path) -> Result<Self> {
        let mut registry = Self::with_builtins();

        if !library_dir.is_dir() {
            tracing::debug!(
                "library directory {} does not exist, using built-ins only",
                library_dir.display()
            );
            return Ok(registry);
        }

        for path in glob_files(library_dir, &["*.toml".to_string()])? {
            match DeclarativeDefinition::from_path(&path) {
                Ok(def) => registry.register(Box::new(def)),
                Err(e) => tracing::warn!("skipping {}: {:#}", path.display(), e),
            }
        }

        tracing::debug!(
            "discovered {} code and {} declarative definitions",
            registry.code.len(),
            registry.declarative.len()
        );
        Ok(registry)
    }

    /// Register a definition. Re-registering a name replaces it.
    pub fn register(&mut self, def: Box<dyn ComponentDefinition>) {
        let name = def.name().to_string();
        match def.origin() {
            DefinitionOrigin::Code => self.code.insert(name, def),
            DefinitionOrigin::Declarative(_) => self.declarative.insert(name, def),
        };
    }

    /// Look up a definition, code first.
    pub fn resolve(&self, name: &str) -> Option<&dyn ComponentDefinition> {
        self.code
            .get(name)
            .or_else(|| self.declarative.get(name))
            .map(|d| d.as_ref())
    }

    /// Check if any definition exists for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.code.contains_key(name) || self.declarative.contains_key(name)
    }

    /// All definition names, sorted and deduplicated across sources.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .code
            .keys()
            .chain(self.declarative.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.names().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.declarative.is_empty()
    }

    /// Instantiate `name` without touching any cache.
    pub fn instantiate(&self, name: &str) -> Result<Component, FactoryError> {
        BuildContext::new(self).build(name)
    }

    pub(crate) fn not_found(&self, name: &str) -> FactoryError {
        let names = self.names();
        FactoryError::DefinitionNotFound {
            name: name.to_string(),
            suggestions: similar_names(name, names.iter().map(String::as_str)),
        }
    }
}

/// State carried through one (possibly nested) instantiation.
pub struct BuildContext<'a> {
    registry: &'a ComponentRegistry,
    stack: Vec<String>,
}

impl<'a> BuildContext<'a> {
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        BuildContext {
            registry,
            stack: Vec::new(),
        }
    }

    /// Build `name`, failing if it is already being built further up.
    pub fn build(&mut self, name: &str) -> Result<Component, FactoryError> {
        if self.stack.iter().any(|n| n == name) {
            let mut chain = self.stack.clone();
            chain.push(name.to_string());
            return Err(FactoryError::DefinitionCycle { chain });
        }

        let def = self
            .registry
            .resolve(name)
            .ok_or_else(|| self.registry.not_found(name))?;

        self.stack.push(name.to_string());
        let result = def.instantiate(self);
        self.stack.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InterfaceSpec;

    struct Fixed {
        name: &'static str,
        origin: DefinitionOrigin,
        voltage: i64,
    }

    impl ComponentDefinition for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn origin(&self) -> DefinitionOrigin {
            self.origin.clone()
        }

        fn instantiate(&self, _ctx: &mut BuildContext<'_>) -> Result<Component, FactoryError> {
            let mut c = Component::new(self.name);
            c.add_parameter("voltage", self.voltage);
            Ok(c)
        }
    }

    /// Embeds another definition by name.
    struct Wrapper {
        name: &'static str,
        inner: &'static str,
    }

    impl ComponentDefinition for Wrapper {
        fn name(&self) -> &str {
            self.name
        }

        fn origin(&self) -> DefinitionOrigin {
            DefinitionOrigin::Code
        }

        fn instantiate(&self, ctx: &mut BuildContext<'_>) -> Result<Component, FactoryError> {
            let inner = ctx.build(self.inner)?;
            let mut c = Component::new(self.name);
            c.add_subcomponent("inner", inner)?;
            c.add_interface("x", InterfaceSpec::delegate("inner", "x"));
            Ok(c)
        }
    }

    #[test]
    fn test_code_wins_over_declarative() {
        let mut registry = ComponentRegistry::new();
        registry.register(Box::new(Fixed {
            name: "Motor",
            origin: DefinitionOrigin::Declarative(PathBuf::from("Motor.toml")),
            voltage: 6,
        }));
        registry.register(Box::new(Fixed {
            name: "Motor",
            origin: DefinitionOrigin::Code,
            voltage: 12,
        }));

        assert_eq!(registry.names(), vec!["Motor"]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("Motor").unwrap().origin(), DefinitionOrigin::Code);

        let motor = registry.instantiate("Motor").unwrap();
        assert_eq!(motor.parameter("voltage").unwrap().to_string(), "12");
    }

    #[test]
    fn test_not_found() {
        let registry = ComponentRegistry::new();
        let err = registry.instantiate("Nope").unwrap_err();
        assert!(matches!(err, FactoryError::DefinitionNotFound { .. }));
    }

    #[test]
    fn test_cycle_detected() {
        let mut registry = ComponentRegistry::new();
        registry.register(Box::new(Wrapper { name: "A", inner: "B" }));
        registry.register(Box::new(Wrapper { name: "B", inner: "A" }));

        match registry.instantiate("A").unwrap_err() {
            FactoryError::DefinitionCycle { chain } => assert_eq!(chain, vec!["A", "B", "A"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_builtins_registered() {
        let registry = ComponentRegistry::with_builtins();
        assert!(registry.contains("Motor"));
        assert!(registry.contains("ServoMount"));
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_discover_missing_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let registry = ComponentRegistry::discover(&tmp.path().join("nope")).unwrap();
        assert_eq!(registry.len(), ComponentRegistry::with_builtins().len());
    }
}

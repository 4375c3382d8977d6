//! The component factory: get-or-build with an instance cache.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheError, InstanceCache};
use crate::core::{Component, ComponentRegistry, FactoryError, ParamValue};

/// Override key that renames the instance.
pub const NAME_OVERRIDE: &str = "name";

/// Override keys that are never accepted.
pub const RESERVED_OVERRIDES: &[&str] = &["remake"];

/// What `get` does when overrides are supplied but the instance comes from
/// the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverridePolicy {
    /// Fail with [`FactoryError::OverridesOnCacheHit`].
    #[default]
    Reject,
    /// Return the cached instance unchanged and log a warning.
    Ignore,
}

/// Per-call overrides: `name` renames the instance, every other key sets
/// a parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides(BTreeMap<String, ParamValue>);

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override. Later values for the same key win.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn check_reserved(&self) -> Result<(), FactoryError> {
        match self.keys().find(|k| RESERVED_OVERRIDES.contains(k)) {
            Some(key) => Err(FactoryError::ReservedOverride {
                key: key.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Apply to a freshly built instance. Returns whether it was renamed.
    fn apply(&self, component: &mut Component) -> bool {
        let mut renamed = false;
        for (key, value) in &self.0 {
            if key == NAME_OVERRIDE {
                let name = match value.as_str() {
                    Some(s) => s.to_string(),
                    None => value.to_string(),
                };
                component.set_name(name);
                renamed = true;
            } else {
                component.set_parameter(key.clone(), value.clone());
            }
        }
        renamed
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Overrides(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Options for [`ComponentFactory::get`].
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Ignore any cached snapshot, rebuild, and overwrite it
    pub remake: bool,

    /// Overrides applied to a freshly built instance
    pub overrides: Overrides,

    /// Behavior when overrides meet a cache hit
    pub override_policy: OverridePolicy,
}

impl GetOptions {
    /// Options that force a rebuild.
    pub fn remake() -> Self {
        GetOptions {
            remake: true,
            ..Self::default()
        }
    }
}

/// Builds components from the registry, going through the instance cache.
pub struct ComponentFactory<'r> {
    registry: &'r ComponentRegistry,
    cache: InstanceCache,
}

impl<'r> ComponentFactory<'r> {
    pub fn new(registry: &'r ComponentRegistry, cache: InstanceCache) -> Self {
        ComponentFactory { registry, cache }
    }

    pub fn registry(&self) -> &'r ComponentRegistry {
        self.registry
    }

    pub fn cache(&self) -> &InstanceCache {
        &self.cache
    }

    /// Get `name`, from the cache if possible.
    ///
    /// On a miss (or with `remake`) the definition is instantiated, the
    /// overrides applied, and the result stored under `name`. The store
    /// only overwrites an existing snapshot when `remake` is set, so a
    /// snapshot written concurrently by someone else surfaces as
    /// [`CacheError::AlreadyExists`] instead of being clobbered.
    pub fn get(&self, name: &str, opts: &GetOptions) -> Result<Component, FactoryError> {
        opts.overrides.check_reserved()?;

        let mut overwrite = opts.remake;
        if !opts.remake {
            match self.cache.load(name) {
                Ok(Some(cached)) => return self.serve_cached(name, cached, opts),
                Ok(None) => {}
                Err(CacheError::IncompatibleVersion {
                    found, expected, ..
                }) => {
                    tracing::warn!(
                        "cached `{}` has snapshot version {} (expected {}), rebuilding",
                        name,
                        found,
                        expected
                    );
                    overwrite = true;
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut instance = self.registry.instantiate(name)?;
        if !opts.overrides.apply(&mut instance) {
            instance.set_name(name);
        }

        self.cache.store(&instance, name, overwrite)?;
        tracing::debug!("built `{}`", name);
        Ok(instance)
    }

    fn serve_cached(
        &self,
        name: &str,
        cached: Component,
        opts: &GetOptions,
    ) -> Result<Component, FactoryError> {
        if opts.overrides.is_empty() {
            return Ok(cached);
        }

        let keys: Vec<String> = opts.overrides.keys().map(str::to_string).collect();
        match opts.override_policy {
            OverridePolicy::Reject => Err(FactoryError::OverridesOnCacheHit {
                name: name.to_string(),
                keys,
            }),
            OverridePolicy::Ignore => {
                tracing::warn!(
                    "`{}` served from cache; ignoring overrides: {}",
                    name,
                    keys.join(", ")
                );
                Ok(cached)
            }
        }
    }
}

//! Read-only component projections reconstructed from the relational index.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::capability::HasCapabilities;
use crate::core::component::Component;

/// A flattened view of a stored component.
///
/// All values are strings as recorded in the index. A projection is not a
/// live [`Component`]: it cannot be instantiated or composed further.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComponentQueryItem {
    name: String,
    /// Interface name -> port type
    interfaces: BTreeMap<String, String>,
    /// Parameter name -> stringified default
    parameters: BTreeMap<String, String>,
    /// Composable key -> composable type
    composables: BTreeMap<String, String>,
}

impl ComponentQueryItem {
    /// Create an empty projection for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        ComponentQueryItem {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Fold `(interface, port_type)` rows in; later rows win.
    pub fn gen_interfaces<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.interfaces.extend(rows);
    }

    /// Fold `(parameter, default)` rows in; later rows win.
    pub fn gen_parameters<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.parameters.extend(rows);
    }

    /// Fold `(key, composable_type)` rows in; later rows win.
    pub fn gen_composables<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.composables.extend(rows);
    }

    pub fn interfaces(&self) -> &BTreeMap<String, String> {
        &self.interfaces
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn composables(&self) -> &BTreeMap<String, String> {
        &self.composables
    }

    /// Build the projection a live component would store, without touching
    /// the index. Delegated interfaces are resolved to their port types;
    /// unresolvable ones are left out.
    pub fn project(component: &Component) -> Self {
        let mut item = ComponentQueryItem::new(component.name());
        item.gen_interfaces(component.interfaces().keys().filter_map(|k| {
            component
                .resolve_interface(k)
                .ok()
                .map(|t| (k.clone(), t.as_str().to_string()))
        }));
        item.gen_parameters(
            component
                .parameters()
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string())),
        );
        item.gen_composables(
            component
                .composables()
                .iter()
                .map(|(k, c)| (k.clone(), c.type_name().to_string())),
        );
        item
    }
}

impl HasCapabilities for ComponentQueryItem {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_composable(&self, key: &str) -> bool {
        self.composables.contains_key(key)
    }
}

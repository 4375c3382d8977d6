//! Composables - pluggable capability modules attached to components.
//!
//! Every composable variant carries an explicit type tag in its serialized
//! form, so a snapshot always decodes back into the same variant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named hook bound to a method on the owning component.
///
/// Bound behavior is kept as data: the binding records which component
/// owns it and which method it refers to, and is re-resolved by name when
/// the composable is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBinding {
    /// Name of the component the method belongs to
    pub owner: String,
    /// Method name on the owner
    pub method: String,
}

/// A capability module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Composable {
    /// Generated firmware / driver code.
    CodeComposable {
        #[serde(default = "default_language")]
        language: String,
        /// Snippet name -> source text
        #[serde(default)]
        snippets: BTreeMap<String, String>,
        /// Hook name -> bound method
        #[serde(default)]
        bindings: BTreeMap<String, MethodBinding>,
    },

    /// Mechanical drawing: faces joined by edges.
    GraphComposable {
        #[serde(default)]
        faces: Vec<String>,
        #[serde(default)]
        edges: Vec<String>,
    },

    /// Electrical wiring: exposed pins.
    ElectricalComposable {
        #[serde(default)]
        pins: Vec<String>,
    },

    /// Purely logical part with no physical or code output.
    VirtualComposable,
}

fn default_language() -> String {
    "arduino".to_string()
}

impl Composable {
    /// A code composable with no snippets.
    pub fn code(language: impl Into<String>) -> Self {
        Composable::CodeComposable {
            language: language.into(),
            snippets: BTreeMap::new(),
            bindings: BTreeMap::new(),
        }
    }

    /// A graph composable with the given faces.
    pub fn graph<I, S>(faces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Composable::GraphComposable {
            faces: faces.into_iter().map(Into::into).collect(),
            edges: Vec::new(),
        }
    }

    /// An electrical composable with the given pins.
    pub fn electrical<I, S>(pins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Composable::ElectricalComposable {
            pins: pins.into_iter().map(Into::into).collect(),
        }
    }

    /// The type tag, as stored in the relational index.
    pub fn type_name(&self) -> &'static str {
        match self {
            Composable::CodeComposable { .. } => "CodeComposable",
            Composable::GraphComposable { .. } => "GraphComposable",
            Composable::ElectricalComposable { .. } => "ElectricalComposable",
            Composable::VirtualComposable => "VirtualComposable",
        }
    }

    /// Add a code snippet. No-op on non-code composables.
    pub fn with_snippet(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        if let Composable::CodeComposable { snippets, .. } = &mut self {
            snippets.insert(name.into(), source.into());
        }
        self
    }

    /// Bind a hook to a method of `owner`. No-op on non-code composables.
    pub fn with_binding(
        mut self,
        hook: impl Into<String>,
        owner: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        if let Composable::CodeComposable { bindings, .. } = &mut self {
            bindings.insert(
                hook.into(),
                MethodBinding {
                    owner: owner.into(),
                    method: method.into(),
                },
            );
        }
        self
    }

    /// Point every binding owned by `old` at `new`.
    ///
    /// Called when the owning component is renamed so bindings stay attached
    /// to the instance rather than to a stale name.
    pub(crate) fn rebind_owner(&mut self, old: &str, new: &str) {
        if let Composable::CodeComposable { bindings, .. } = self {
            for binding in bindings.values_mut() {
                if binding.owner == old {
                    binding.owner = new.to_string();
                }
            }
        }
    }
}

//! Capability membership.
//!
//! A component "has" a capability when a composable is attached under that
//! key. Live components and stored projections answer the same question
//! through [`HasCapabilities`], so filters work uniformly over both.

/// Tag that matches every component.
pub const ALL_CAPABILITIES: &str = "all";

/// Anything that can be filtered by capability.
pub trait HasCapabilities {
    /// The component name.
    fn name(&self) -> &str;

    /// Check if a composable is attached under `key`.
    fn has_composable(&self, key: &str) -> bool;

    /// Check capability membership; `"all"` always matches.
    fn has_capability(&self, tag: &str) -> bool {
        tag == ALL_CAPABILITIES || self.has_composable(tag)
    }
}

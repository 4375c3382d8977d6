//! High-level operations.
//!
//! The factory ties the registry to the instance cache; filters run
//! capability queries over either the factory or the relational index.

pub mod factory;
pub mod filter;

pub use factory::{ComponentFactory, GetOptions, OverridePolicy, Overrides};
pub use filter::{build_each, filter_by_capability, filter_stored, FilterReport, Skip};

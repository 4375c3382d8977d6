//! rocolib - a component library for composable robot parts
//!
//! This crate models hardware/software building blocks as components with
//! typed interfaces, parameters and capability modules, builds them through
//! a cached factory, and indexes them in a relational store for capability
//! queries.

pub mod cache;
pub mod core;
pub mod db;
pub mod library;
pub mod ops;
pub mod util;

/// Test utilities for rocolib unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests.
#[cfg(test)]
pub mod test_support;

pub use cache::InstanceCache;
pub use core::{
    Component, ComponentQueryItem, ComponentRegistry, HasCapabilities, InterfaceSpec, ParamValue,
    PortType,
};
pub use db::ComponentStore;
pub use ops::{ComponentFactory, GetOptions};
pub use util::context::GlobalContext;

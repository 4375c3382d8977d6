//! Core data structures for rocolib.
//!
//! This module contains the component model and the definition registry:
//! - Components, interfaces, parameters and composables
//! - Capability membership shared by live components and projections
//! - The registry of named definitions the factory builds from

pub mod capability;
pub mod component;
pub mod composable;
pub mod errors;
pub mod interface;
pub mod parameter;
pub mod query_item;
pub mod registry;

pub use capability::{HasCapabilities, ALL_CAPABILITIES};
pub use component::{Component, ModelError, Subcomponent};
pub use composable::{Composable, MethodBinding};
pub use errors::{ErrorKind, FactoryError};
pub use interface::{Connection, Endpoint, InterfaceSpec, PortType};
pub use parameter::ParamValue;
pub use query_item::ComponentQueryItem;
pub use registry::{BuildContext, ComponentDefinition, ComponentRegistry, DefinitionOrigin};

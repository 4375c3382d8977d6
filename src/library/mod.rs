//! Component definitions: built into the crate or loaded from files.

pub mod builtin;
pub mod declarative;

pub use builtin::CodeDefinition;
pub use declarative::{check_library, DeclarativeDefinition};

//! Factory error types and diagnostics.

use std::path::PathBuf;

use thiserror::Error;

use crate::cache::CacheError;
use crate::core::component::ModelError;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Coarse error classification for an API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested thing does not exist
    NotFound,
    /// The request collides with existing state
    Conflict,
    /// The request or a definition is malformed
    Invalid,
    /// Storage failed underneath
    Io,
}

/// Error while obtaining a component from the factory.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("no component definition named `{name}`")]
    DefinitionNotFound {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("component definitions reference each other: {}", chain.join(" -> "))]
    DefinitionCycle { chain: Vec<String> },

    #[error("invalid definition for `{name}` in {}: {message}", path.display())]
    InvalidDefinition {
        name: String,
        path: PathBuf,
        message: String,
    },

    #[error("`{name}` was served from the cache, so overrides {} would be ignored", keys.join(", "))]
    OverridesOnCacheHit { name: String, keys: Vec<String> },

    #[error("`{key}` is reserved and cannot be used as an override")]
    ReservedOverride { key: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl FactoryError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FactoryError::DefinitionNotFound { .. } => ErrorKind::NotFound,
            FactoryError::OverridesOnCacheHit { .. } => ErrorKind::Conflict,
            FactoryError::DefinitionCycle { .. }
            | FactoryError::InvalidDefinition { .. }
            | FactoryError::ReservedOverride { .. }
            | FactoryError::Model(_) => ErrorKind::Invalid,
            FactoryError::Cache(e) => e.kind(),
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            FactoryError::DefinitionNotFound { name, suggestions } => {
                let mut diag = Diagnostic::error(format!("no component named `{}`", name));
                if !suggestions.is_empty() {
                    diag = diag.with_context(format!("similar names: {}", suggestions.join(", ")));
                }
                diag.with_suggestion(suggestions::COMPONENT_NOT_FOUND)
            }

            FactoryError::DefinitionCycle { chain } => {
                Diagnostic::error("component definitions reference each other")
                    .with_context(format!("cycle: {}", chain.join(" -> ")))
                    .with_suggestion("Remove the subcomponent entry that closes the cycle")
            }

            FactoryError::InvalidDefinition {
                name,
                path,
                message,
            } => Diagnostic::error(format!("invalid definition for `{}`", name))
                .with_location(path)
                .with_context(message.clone()),

            FactoryError::OverridesOnCacheHit { name, keys } => Diagnostic::error(format!(
                "`{}` is cached; overrides would be ignored",
                name
            ))
            .with_context(format!("overrides: {}", keys.join(", ")))
            .with_suggestion(suggestions::USE_REMAKE),

            FactoryError::ReservedOverride { key } => {
                Diagnostic::error(format!("`{}` cannot be used as an override", key))
            }

            FactoryError::Model(e) => Diagnostic::error(e.to_string()),

            FactoryError::Cache(e) => e.to_diagnostic(),
        }
    }
}

/// Names from `candidates` that look like `name`.
pub(crate) fn similar_names<'a>(
    name: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let needle = name.to_lowercase();
    candidates
        .into_iter()
        .filter(|c| {
            let c = c.to_lowercase();
            !needle.is_empty() && (c.contains(&needle) || needle.contains(&c))
        })
        .map(str::to_string)
        .collect()
}

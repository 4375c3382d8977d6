//! Configuration file support for roco.
//!
//! Two configuration file locations are read:
//! - Global: `<home>/config.toml` - User-wide defaults
//! - Project: `.roco/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::db::retry::RetryPolicy;
use crate::ops::factory::OverridePolicy;

/// roco configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Declarative component library
    pub library: LibraryConfig,

    /// Instance cache settings
    pub cache: CacheConfig,

    /// Relational index settings
    pub database: DatabaseConfig,

    /// Factory behavior
    pub factory: FactoryConfig,
}

/// Library settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory holding `*.toml` component files
    pub path: Option<PathBuf>,
}

/// Cache settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Snapshot directory
    pub dir: Option<PathBuf>,
}

/// Database settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file for the relational index
    pub path: Option<PathBuf>,

    /// How long SQLite waits on a locked database before reporting busy
    pub busy_timeout_ms: Option<u64>,

    /// Retry settings for busy/locked errors
    pub retry: RetryConfig,
}

/// Retry settings, all optional so layers merge field by field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
    pub multiplier: Option<f64>,
}

/// Factory settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// What to do with overrides on a cache hit: `reject` or `ignore`
    pub override_policy: Option<OverridePolicy>,
}

/// Default SQLite busy timeout.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.library.path.is_some() {
            self.library.path = other.library.path;
        }
        if other.cache.dir.is_some() {
            self.cache.dir = other.cache.dir;
        }

        if other.database.path.is_some() {
            self.database.path = other.database.path;
        }
        if other.database.busy_timeout_ms.is_some() {
            self.database.busy_timeout_ms = other.database.busy_timeout_ms;
        }
        let retry = other.database.retry;
        if retry.max_attempts.is_some() {
            self.database.retry.max_attempts = retry.max_attempts;
        }
        if retry.initial_backoff_ms.is_some() {
            self.database.retry.initial_backoff_ms = retry.initial_backoff_ms;
        }
        if retry.max_backoff_ms.is_some() {
            self.database.retry.max_backoff_ms = retry.max_backoff_ms;
        }
        if retry.multiplier.is_some() {
            self.database.retry.multiplier = retry.multiplier;
        }

        if other.factory.override_policy.is_some() {
            self.factory.override_policy = other.factory.override_policy;
        }
    }

    /// Effective busy timeout.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(
            self.database
                .busy_timeout_ms
                .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
        )
    }

    /// Effective retry policy, with unset fields taken from the default.
    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        let retry = &self.database.retry;
        RetryPolicy {
            max_attempts: retry.max_attempts.unwrap_or(defaults.max_attempts),
            initial_backoff: retry
                .initial_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_backoff),
            max_backoff: retry
                .max_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_backoff),
            multiplier: retry.multiplier.unwrap_or(defaults.multiplier),
        }
    }

    /// Effective override policy.
    pub fn override_policy(&self) -> OverridePolicy {
        self.factory.override_policy.unwrap_or_default()
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.roco/config.toml)
/// 2. Global config (<home>/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

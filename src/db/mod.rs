//! Relational component index backed by SQLite.
//!
//! [`ComponentStore`] owns one connection. Writing happens in [`sync`],
//! reading in [`query`].

pub mod query;
pub mod retry;
pub mod schema;
pub mod sync;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, ErrorCode};
use thiserror::Error;

use crate::core::{ErrorKind, ModelError};
use crate::util::diagnostic::{suggestions, Diagnostic};

pub use retry::RetryPolicy;
pub use schema::{Table, SCHEMA_VERSION};
pub use sync::{SyncReport, TableCounts};

/// Relational store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("index schema version {found} is newer than supported version {expected}")]
    SchemaVersion { found: i64, expected: i64 },

    #[error("failed to create index directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Sqlite(e) if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
                ErrorKind::Conflict
            }
            StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows) => ErrorKind::NotFound,
            StoreError::Model(_) => ErrorKind::Invalid,
            StoreError::Sqlite(_) | StoreError::SchemaVersion { .. } | StoreError::Io { .. } => {
                ErrorKind::Io
            }
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            StoreError::Sqlite(e) if retry::is_transient(e) => {
                diag.with_suggestion(suggestions::DATABASE_BUSY)
            }
            StoreError::SchemaVersion { .. } => diag
                .with_context("the index was written by a newer roco")
                .with_suggestion("Point `[database] path` at a fresh file and run `roco sync`"),
            StoreError::Io { path, .. } => diag.with_location(path),
            _ => diag,
        }
    }
}

/// Connection settings.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub busy_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            busy_timeout: Duration::from_millis(crate::util::config::DEFAULT_BUSY_TIMEOUT_MS),
            retry: RetryPolicy::default(),
        }
    }
}

/// The relational component index.
pub struct ComponentStore {
    conn: Connection,
    retry: RetryPolicy,
}

impl ComponentStore {
    /// Open or create the index at `path`.
    pub fn open(path: &Path, options: &StoreOptions) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = options.retry.run(|| Connection::open(path))?;
        conn.busy_timeout(options.busy_timeout)?;
        // WAL lets readers proceed while a sync is writing
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        tracing::debug!("opened index at {}", path.display());
        Self::with_connection(conn, options.retry.clone())
    }

    /// An index that lives only as long as the store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, RetryPolicy::none())
    }

    fn with_connection(conn: Connection, retry: RetryPolicy) -> Result<Self, StoreError> {
        schema::init(&conn)?;
        Ok(ComponentStore { conn, retry })
    }

    /// Replace the retry policy.
    pub fn set_retry(&mut self, retry: RetryPolicy) {
        self.retry = retry;
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

//! Instance cache - durable component snapshots keyed by name.
//!
//! Each component is stored as `<dir>/<name>.snap.json`. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so a reader sees either the old snapshot or the new one, never a
//! partial write. Without `overwrite` the rename is no-clobber, which makes
//! the already-exists check race-free per name.

pub mod snapshot;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::core::{Component, ErrorKind};
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::glob_files;

/// Snapshot file suffix.
pub const SNAPSHOT_SUFFIX: &str = ".snap.json";

/// Instance cache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("a cached snapshot for `{name}` already exists")]
    AlreadyExists { name: String, path: PathBuf },

    #[error("`{name}` cannot be used as a cache key")]
    InvalidName { name: String },

    #[error("snapshot for `{name}` has codec version {found}, expected {expected}")]
    IncompatibleVersion {
        name: String,
        found: u32,
        expected: u32,
    },

    #[error("snapshot for `{name}` is corrupt: {reason}")]
    Corrupt { name: String, reason: String },

    #[error("`{name}` cannot be snapshotted: {reason}")]
    Unencodable { name: String, reason: String },

    #[error("cache I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CacheError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CacheError::AlreadyExists { .. } => ErrorKind::Conflict,
            CacheError::InvalidName { .. } | CacheError::Unencodable { .. } => ErrorKind::Invalid,
            CacheError::IncompatibleVersion { .. }
            | CacheError::Corrupt { .. }
            | CacheError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            CacheError::AlreadyExists { path, .. } => diag
                .with_location(path)
                .with_suggestion(suggestions::USE_REMAKE),
            CacheError::InvalidName { .. } => diag.with_context(
                "cache keys may only contain letters, digits, `_`, `-` and `.`",
            ),
            CacheError::IncompatibleVersion { name, .. } | CacheError::Corrupt { name, .. } => {
                diag.with_suggestion(format!("Remove it with `roco cache remove {}`", name))
            }
            CacheError::Unencodable { .. } => {
                diag.with_context("parameters must be finite numbers to be cached")
            }
            CacheError::Io { path, .. } => diag.with_location(path),
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        CacheError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Snapshot store for built components.
#[derive(Debug, Clone)]
pub struct InstanceCache {
    dir: PathBuf,
}

impl InstanceCache {
    /// Create a cache rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        InstanceCache { dir: dir.into() }
    }

    /// Get the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot for `name`.
    pub fn snapshot_path(&self, name: &str) -> Result<PathBuf, CacheError> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{}{}", name, SNAPSHOT_SUFFIX)))
    }

    /// Check if a snapshot exists for `name`.
    pub fn exists(&self, name: &str) -> Result<bool, CacheError> {
        Ok(self.snapshot_path(name)?.is_file())
    }

    /// Load the snapshot for `name`. A missing snapshot is `Ok(None)`.
    pub fn load(&self, name: &str) -> Result<Option<Component>, CacheError> {
        let path = self.snapshot_path(name)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("cache miss for `{}`", name);
                return Ok(None);
            }
            Err(e) => return Err(CacheError::io(&path, e)),
        };

        let component = snapshot::decode(name, &bytes)?;
        tracing::debug!("cache hit for `{}`", name);
        Ok(Some(component))
    }

    /// Store `component` under `name`.
    ///
    /// Fails with [`CacheError::AlreadyExists`] if a snapshot exists and
    /// `overwrite` is false.
    pub fn store(
        &self,
        component: &Component,
        name: &str,
        overwrite: bool,
    ) -> Result<(), CacheError> {
        let path = self.snapshot_path(name)?;
        if !overwrite && path.exists() {
            return Err(CacheError::AlreadyExists {
                name: name.to_string(),
                path,
            });
        }

        let bytes = snapshot::encode(name, component)?;

        fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        tmp.write_all(&bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| CacheError::io(tmp.path(), e))?;

        // The temp file is removed on drop if persisting fails.
        let persisted = if overwrite {
            tmp.persist(&path)
        } else {
            tmp.persist_noclobber(&path)
        };
        match persisted {
            Ok(_) => {
                tracing::debug!("stored snapshot for `{}` at {}", name, path.display());
                Ok(())
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(CacheError::AlreadyExists {
                    name: name.to_string(),
                    path,
                })
            }
            Err(e) => Err(CacheError::io(&path, e.error)),
        }
    }

    /// Remove the snapshot for `name`. Returns whether one existed.
    pub fn remove(&self, name: &str) -> Result<bool, CacheError> {
        let path = self.snapshot_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(&path, e)),
        }
    }

    /// Names with a stored snapshot, sorted.
    pub fn list(&self) -> Result<Vec<String>, CacheError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let pattern = format!("*{}", SNAPSHOT_SUFFIX);
        let files = glob_files(&self.dir, &[pattern]).map_err(|e| {
            CacheError::io(&self.dir, io::Error::new(io::ErrorKind::Other, e.to_string()))
        })?;

        Ok(files
            .iter()
            .filter_map(|p| p.file_name()?.to_str()?.strip_suffix(SNAPSHOT_SUFFIX))
            .map(str::to_string)
            .collect())
    }

    /// Remove every snapshot. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let names = self.list()?;
        for name in &names {
            self.remove(name)?;
        }
        Ok(names.len())
    }
}

/// Cache keys become file names, so they are restricted to a safe alphabet.
fn validate_name(name: &str) -> Result<(), CacheError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidName {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::{motor, servo_mount};
    use tempfile::TempDir;

    #[test]
    fn test_miss_is_none() {
        let tmp = TempDir::new().unwrap();
        let cache = InstanceCache::new(tmp.path().join("cache"));
        assert!(cache.load("Motor").unwrap().is_none());
        assert!(!cache.exists("Motor").unwrap());
    }

    #[test]
    fn test_store_then_load() {
        let tmp = TempDir::new().unwrap();
        let cache = InstanceCache::new(tmp.path());
        let mount = servo_mount();

        cache.store(&mount, "n", true).unwrap();
        let loaded = cache.load("n").unwrap().unwrap();

        assert_eq!(loaded.name(), mount.name());
        assert_eq!(loaded.interfaces(), mount.interfaces());
        assert_eq!(loaded.parameters(), mount.parameters());
        assert_eq!(loaded.composables(), mount.composables());
        assert_eq!(loaded.subcomponents(), mount.subcomponents());
    }

    #[test]
    fn test_overwrite_guard() {
        let tmp = TempDir::new().unwrap();
        let cache = InstanceCache::new(tmp.path());

        cache.store(&motor(), "n", false).unwrap();
        let err = cache.store(&motor(), "n", false).unwrap_err();
        assert!(matches!(err, CacheError::AlreadyExists { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_overwrite_replaces() {
        let tmp = TempDir::new().unwrap();
        let cache = InstanceCache::new(tmp.path());

        cache.store(&motor(), "n", false).unwrap();
        let mut changed = motor();
        changed.set_parameter("voltage", 24);
        cache.store(&changed, "n", true).unwrap();

        let loaded = cache.load("n").unwrap().unwrap();
        assert_eq!(loaded.parameter("voltage").unwrap().to_string(), "24");
    }

    #[test]
    fn test_non_finite_param_is_not_stored() {
        let tmp = TempDir::new().unwrap();
        let cache = InstanceCache::new(tmp.path());
        let mut m = motor();
        m.set_parameter("limit", f64::INFINITY);

        let err = cache.store(&m, "Motor", false).unwrap_err();
        assert!(matches!(err, CacheError::Unencodable { .. }));
        assert_eq!(err.kind(), ErrorKind::Invalid);
        assert!(!cache.exists("Motor").unwrap());
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let cache = InstanceCache::new(tmp.path());

        cache.store(&motor(), "a", false).unwrap();
        let _ = cache.store(&motor(), "a", false);

        let entries: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_invalid_names() {
        let tmp = TempDir::new().unwrap();
        let cache = InstanceCache::new(tmp.path());

        for bad in ["", "../etc", "a/b", ".hidden", "x y"] {
            assert!(
                matches!(cache.load(bad), Err(CacheError::InvalidName { .. })),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_list_remove_clear() {
        let tmp = TempDir::new().unwrap();
        let cache = InstanceCache::new(tmp.path());

        cache.store(&motor(), "b", false).unwrap();
        cache.store(&motor(), "a", false).unwrap();
        assert_eq!(cache.list().unwrap(), vec!["a", "b"]);

        assert!(cache.remove("a").unwrap());
        assert!(!cache.remove("a").unwrap());
        assert_eq!(cache.clear().unwrap(), 1);
        assert!(cache.list().unwrap().is_empty());
    }
}

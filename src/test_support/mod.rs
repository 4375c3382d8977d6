//! Test utilities for rocolib unit tests.
//!
//! [`TestEnv`] gives each test an isolated library directory, instance
//! cache and index database under one temporary directory.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::test_support::{fixtures::LibraryFixture, TestEnv};
//!
//! #[test]
//! fn test_example() {
//!     let env = TestEnv::with_library(LibraryFixture::wheel());
//!     let registry = env.registry();
//!     let factory = env.factory(&registry);
//!     // ...
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::cache::InstanceCache;
use crate::core::ComponentRegistry;
use crate::db::{ComponentStore, StoreOptions};
use crate::ops::ComponentFactory;
use fixtures::LibraryFixture;

/// An isolated on-disk environment.
pub struct TestEnv {
    tmp: TempDir,
}

impl TestEnv {
    /// An environment with an empty library.
    pub fn new() -> Self {
        TestEnv {
            tmp: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// An environment whose library holds `library`.
    pub fn with_library(library: LibraryFixture) -> Self {
        let env = Self::new();
        library
            .write_to(&env.library_dir())
            .expect("failed to write library");
        env
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn library_dir(&self) -> PathBuf {
        self.root().join("components")
    }

    pub fn cache(&self) -> InstanceCache {
        InstanceCache::new(self.root().join("cache"))
    }

    pub fn database_path(&self) -> PathBuf {
        self.root().join("index.db")
    }

    /// Built-ins plus the library directory.
    pub fn registry(&self) -> ComponentRegistry {
        ComponentRegistry::discover(&self.library_dir()).expect("failed to discover library")
    }

    pub fn factory<'r>(&self, registry: &'r ComponentRegistry) -> ComponentFactory<'r> {
        ComponentFactory::new(registry, self.cache())
    }

    /// Open the file-backed index.
    pub fn store(&self) -> ComponentStore {
        ComponentStore::open(&self.database_path(), &StoreOptions::default())
            .expect("failed to open index")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::GetOptions;

    #[test]
    fn test_env_round_trip() {
        let env = TestEnv::with_library(LibraryFixture::wheel());
        let registry = env.registry();
        let factory = env.factory(&registry);

        let wheel = factory.get("Wheel", &GetOptions::default()).unwrap();
        let mut store = env.store();
        store.synchronize(&wheel).unwrap();

        assert_eq!(store.stored_names().unwrap(), vec!["Wheel"]);
        assert!(env.cache().exists("Wheel").unwrap());
    }
}

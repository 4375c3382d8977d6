//! Global context for roco operations.
//!
//! Provides centralized access to configuration, paths, and environment.
//! Relative paths from configuration are resolved against the working
//! directory.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::util::config::{load_config, Config};

/// Environment variable that overrides the roco home directory.
pub const HOME_ENV: &str = "ROCO_HOME";

/// Name of the project-local directory.
pub const PROJECT_DIR: &str = ".roco";

/// Default library directory, relative to the working directory.
pub const DEFAULT_LIBRARY_DIR: &str = "components";

/// Project directories for roco
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("com", "roco", "roco"));

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global roco data
    home: PathBuf,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,

    /// Merged configuration
    config: Config,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults. Configuration is not read
    /// until [`GlobalContext::load_config`] is called.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let home = match std::env::var_os(HOME_ENV) {
            Some(home) if !home.is_empty() => PathBuf::from(home),
            _ => match PROJECT_DIRS.as_ref() {
                Some(dirs) => dirs.data_dir().to_path_buf(),
                None => cwd.join(PROJECT_DIR),
            },
        };

        Ok(GlobalContext {
            cwd,
            home,
            verbose: false,
            color: true,
            config: Config::default(),
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Replace the home directory.
    pub fn with_home(mut self, home: PathBuf) -> Self {
        self.home = home;
        self
    }

    /// Read and merge the global and project configuration files.
    pub fn load_config(&mut self) {
        self.config = load_config(&self.config_path(), &self.project_config_path());
        tracing::debug!("loaded configuration: {:?}", self.config);
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the roco home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the merged configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Get the project-local roco directory.
    pub fn project_dir(&self) -> PathBuf {
        self.cwd.join(PROJECT_DIR)
    }

    /// Get the project configuration file path.
    pub fn project_config_path(&self) -> PathBuf {
        self.project_dir().join("config.toml")
    }

    /// Directory holding declarative component files.
    pub fn library_dir(&self) -> PathBuf {
        match &self.config.library.path {
            Some(path) => self.resolve(path),
            None => self.cwd.join(DEFAULT_LIBRARY_DIR),
        }
    }

    /// Snapshot directory for the instance cache.
    pub fn cache_dir(&self) -> PathBuf {
        match &self.config.cache.dir {
            Some(dir) => self.resolve(dir),
            None => self.project_dir().join("cache"),
        }
    }

    /// SQLite file for the relational index.
    pub fn database_path(&self) -> PathBuf {
        match &self.config.database.path {
            Some(path) => self.resolve(path),
            None => self.project_dir().join("index.db"),
        }
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context_in(tmp: &TempDir) -> GlobalContext {
        GlobalContext::with_cwd(tmp.path().join("project"))
            .unwrap()
            .with_home(tmp.path().join("home"))
    }

    #[test]
    fn test_context_paths() {
        let ctx = GlobalContext::new().unwrap();
        assert!(ctx.cwd().is_absolute());
        assert!(ctx.config_path().ends_with("config.toml"));
    }

    #[test]
    fn test_default_locations() {
        let tmp = TempDir::new().unwrap();
        let ctx = context_in(&tmp);
        let project = tmp.path().join("project");

        assert_eq!(ctx.library_dir(), project.join("components"));
        assert_eq!(ctx.cache_dir(), project.join(".roco/cache"));
        assert_eq!(ctx.database_path(), project.join(".roco/index.db"));
    }

    #[test]
    fn test_configured_locations() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context_in(&tmp);

        std::fs::create_dir_all(tmp.path().join("home")).unwrap();
        std::fs::write(
            tmp.path().join("home/config.toml"),
            "[library]\npath = \"/shared/components\"\n[cache]\ndir = \"/shared/cache\"\n",
        )
        .unwrap();
        std::fs::create_dir_all(tmp.path().join("project/.roco")).unwrap();
        std::fs::write(
            tmp.path().join("project/.roco/config.toml"),
            "[cache]\ndir = \"snapshots\"\n",
        )
        .unwrap();

        ctx.load_config();

        assert_eq!(ctx.library_dir(), PathBuf::from("/shared/components"));
        assert_eq!(ctx.cache_dir(), tmp.path().join("project/snapshots"));
    }
}

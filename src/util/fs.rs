//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// Read a file to string.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))
}

/// Find files matching glob patterns relative to a base directory.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        // Escape the base so directory names with glob metacharacters match literally
        let escaped_base = glob::Pattern::escape(&base.to_string_lossy());
        let full_pattern = Path::new(&escaped_base).join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in glob(&pattern_str)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_glob_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Motor.toml"), "").unwrap();
        fs::write(tmp.path().join("Wheel.toml"), "").unwrap();
        fs::write(tmp.path().join("readme.txt"), "readme").unwrap();
        fs::create_dir_all(tmp.path().join("sub.toml")).unwrap();

        let files = glob_files(tmp.path(), &["*.toml".to_string()]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("Motor.toml"));
    }

    #[test]
    fn test_glob_base_with_metacharacters() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("lib[v2]");
        fs::create_dir_all(&base).unwrap();
        fs::write(base.join("Motor.toml"), "").unwrap();

        let files = glob_files(&base, &["*.toml".to_string()]).unwrap();
        assert_eq!(files.len(), 1);
    }
}

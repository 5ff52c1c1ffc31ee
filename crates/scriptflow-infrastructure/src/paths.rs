//! Unified path management for scriptflow files.
//!
//! ```text
//! ~/.config/scriptflow/        # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/scriptflow/   # Data directory
//! └── store/                   # Default document store root
//!     └── <collection>/
//!         └── <screen id>.json
//! ```
//!
//! Every path can be re-rooted under a base directory (tests, portable
//! installs).

use scriptflow_core::ScriptflowError;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "scriptflow";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for ScriptflowError {
    fn from(e: PathError) -> Self {
        ScriptflowError::config(e.to_string())
    }
}

/// Resolves scriptflow directories, optionally under a fixed base directory.
#[derive(Debug, Clone, Default)]
pub struct ScriptflowPaths {
    base_dir: Option<PathBuf>,
}

impl ScriptflowPaths {
    /// # Arguments
    ///
    /// * `base_dir` - When set, `config/` and `data/` live under it instead of
    ///   the platform directories
    pub fn new(base_dir: Option<&Path>) -> Self {
        Self {
            base_dir: base_dir.map(Path::to_path_buf),
        }
    }

    /// Returns the configuration directory (e.g. `~/.config/scriptflow/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_dir {
            Some(base) => Ok(base.join("config")),
            None => dirs::config_dir()
                .map(|d| d.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    /// Returns the data directory (e.g. `~/.local/share/scriptflow/`).
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base_dir {
            Some(base) => Ok(base.join("data")),
            None => dirs::data_dir()
                .map(|d| d.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Root of the JSON document store when none is configured.
    pub fn default_store_root(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("store"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_dir_overrides_platform_dirs() {
        let paths = ScriptflowPaths::new(Some(Path::new("/tmp/sf")));
        assert_eq!(paths.config_file().unwrap(), PathBuf::from("/tmp/sf/config/config.toml"));
        assert_eq!(paths.default_store_root().unwrap(), PathBuf::from("/tmp/sf/data/store"));
    }

    #[test]
    fn test_platform_dirs_end_with_app_dir() {
        let paths = ScriptflowPaths::default();
        if let Ok(dir) = paths.config_dir() {
            assert!(dir.ends_with(APP_DIR));
        }
    }
}

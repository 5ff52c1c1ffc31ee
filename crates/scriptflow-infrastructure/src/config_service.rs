//! Configuration service implementation.
//!
//! Loads the root configuration from `~/.config/scriptflow/config.toml`,
//! writing the defaults there on first run.

use crate::paths::ScriptflowPaths;
use crate::storage::write_atomic;
use scriptflow_core::config::RootConfig;
use scriptflow_core::error::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    /// Service reading the platform config file.
    pub fn new() -> Self {
        Self::from_paths(&ScriptflowPaths::default())
    }

    pub fn from_paths(paths: &ScriptflowPaths) -> Self {
        Self {
            path: paths.config_file().ok(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Service reading an explicit file (`--config`).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Gets the root configuration, loading it if not cached.
    ///
    /// Unreadable or invalid files fall back to the defaults with a warning.
    pub fn get_config(&self) -> RootConfig {
        if let Some(cached) = self.config.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
            return cached.clone();
        }

        let loaded = self.load().unwrap_or_else(|e| {
            tracing::warn!("[ConfigService] Using default configuration: {}", e);
            RootConfig::default()
        });

        *self.config.write().unwrap_or_else(|e| e.into_inner()) = Some(loaded.clone());
        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Reads the config file, creating it with defaults when missing.
    pub fn load(&self) -> Result<RootConfig> {
        let Some(path) = &self.path else {
            return Ok(RootConfig::default());
        };

        if !path.exists() {
            let defaults = RootConfig::default();
            if let Err(e) = Self::write(path, &defaults) {
                tracing::debug!(
                    "[ConfigService] Could not create {}: {}",
                    path.display(),
                    e
                );
            } else {
                tracing::info!("[ConfigService] Created default config at {}", path.display());
            }
            return Ok(defaults);
        }

        let content = std::fs::read_to_string(path)?;
        let config: RootConfig = toml::from_str(&content)?;
        tracing::debug!("[ConfigService] Loaded {}", path.display());
        Ok(config)
    }

    /// Persists `config` and refreshes the cache.
    pub fn save(&self, config: &RootConfig) -> Result<()> {
        if let Some(path) = &self.path {
            Self::write(path, config)?;
        }
        *self.config.write().unwrap_or_else(|e| e.into_inner()) = Some(config.clone());
        Ok(())
    }

    fn write(path: &Path, config: &RootConfig) -> Result<()> {
        let content = toml::to_string_pretty(config)?;
        write_atomic(path, content.as_bytes())
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

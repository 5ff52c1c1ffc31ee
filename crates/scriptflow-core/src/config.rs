//! Configuration model.
//!
//! Loaded from `config.toml` by the infrastructure `ConfigService`; every
//! section falls back to its default when absent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default file read for physical-person scripts.
pub const DEFAULT_PHYSICAL_SOURCE: &str = "roteiros.json";
/// Default file read for legal-entity scripts.
pub const DEFAULT_LEGAL_ENTITY_SOURCE: &str = "roteiros1.json";
/// Default remote collection holding one document per screen.
pub const DEFAULT_COLLECTION: &str = "roteiros";

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RootConfig {
    #[serde(default)]
    pub sources: SourceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub autosave: AutoSaveConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Where the two structured script documents live.
///
/// Values starting with `http://` or `https://` are fetched over HTTP,
/// anything else is a local path.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SourceConfig {
    #[serde(default = "default_physical_source")]
    pub physical: String,
    #[serde(default = "default_legal_entity_source")]
    pub legal_entity: String,
}

fn default_physical_source() -> String {
    DEFAULT_PHYSICAL_SOURCE.to_string()
}

fn default_legal_entity_source() -> String {
    DEFAULT_LEGAL_ENTITY_SOURCE.to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            physical: default_physical_source(),
            legal_entity: default_legal_entity_source(),
        }
    }
}

impl SourceConfig {
    /// Whether every configured source is an HTTP(S) URL.
    pub fn is_remote(&self) -> bool {
        is_http(&self.physical) && is_http(&self.legal_entity)
    }
}

fn is_http(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Remote document store settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct StoreConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Root directory of the store. `None` means the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            collection: default_collection(),
            root: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AutoSaveConfig {
    /// Quiet window per screen before a pending write fires.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Upper bound of pending per-screen writes.
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
}

fn default_debounce_ms() -> u64 {
    800
}

fn default_max_pending() -> usize {
    64
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_pending: default_max_pending(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: RootConfig = toml::from_str("").unwrap();
        assert_eq!(config, RootConfig::default());
        assert_eq!(config.sources.physical, "roteiros.json");
        assert_eq!(config.autosave.debounce_ms, 800);
        assert!(config.store.enabled);
    }

    #[test]
    fn test_partial_sections() {
        let config: RootConfig = toml::from_str(
            r#"
            [sources]
            physical = "https://cdn.example.com/pf.json"
            legal_entity = "https://cdn.example.com/pj.json"

            [autosave]
            debounce_ms = 250
            "#,
        )
        .unwrap();

        assert!(config.sources.is_remote());
        assert_eq!(config.autosave.debounce_ms, 250);
        assert_eq!(config.autosave.max_pending, 64);
        assert_eq!(config.store.collection, "roteiros");
    }
}

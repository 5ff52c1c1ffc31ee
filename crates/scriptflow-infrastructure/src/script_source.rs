//! `ScriptSource` implementations for the structured script documents.

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use scriptflow_core::ScriptflowError;
use scriptflow_core::config::SourceConfig;
use scriptflow_core::error::Result;
use scriptflow_core::screen::ScriptSource;
use scriptflow_core::session::PersonType;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Reads the two documents from local files, every call hitting the disk.
#[derive(Debug, Clone)]
pub struct FileScriptSource {
    physical: PathBuf,
    legal_entity: PathBuf,
}

impl FileScriptSource {
    pub fn new(physical: impl Into<PathBuf>, legal_entity: impl Into<PathBuf>) -> Self {
        Self {
            physical: physical.into(),
            legal_entity: legal_entity.into(),
        }
    }

    fn path_for(&self, person_type: PersonType) -> &PathBuf {
        match person_type {
            PersonType::Physical => &self.physical,
            PersonType::LegalEntity => &self.legal_entity,
        }
    }
}

#[async_trait]
impl ScriptSource for FileScriptSource {
    async fn fetch(&self, person_type: PersonType) -> Result<Value> {
        let path = self.path_for(person_type);
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ScriptflowError::data_source(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ScriptflowError::data_source(format!("{} is not valid JSON: {}", path.display(), e))
        })
    }

    fn describe(&self, person_type: PersonType) -> String {
        self.path_for(person_type).display().to_string()
    }
}

/// Fetches the two documents over HTTP, bypassing intermediate caches.
#[derive(Debug, Clone)]
pub struct HttpScriptSource {
    client: reqwest::Client,
    physical: String,
    legal_entity: String,
}

impl HttpScriptSource {
    pub fn new(physical: impl Into<String>, legal_entity: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), physical, legal_entity)
    }

    pub fn with_client(
        client: reqwest::Client,
        physical: impl Into<String>,
        legal_entity: impl Into<String>,
    ) -> Self {
        Self {
            client,
            physical: physical.into(),
            legal_entity: legal_entity.into(),
        }
    }

    fn url_for(&self, person_type: PersonType) -> &str {
        match person_type {
            PersonType::Physical => &self.physical,
            PersonType::LegalEntity => &self.legal_entity,
        }
    }
}

#[async_trait]
impl ScriptSource for HttpScriptSource {
    async fn fetch(&self, person_type: PersonType) -> Result<Value> {
        let url = self.url_for(person_type);
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| ScriptflowError::data_source(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScriptflowError::data_source(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            ScriptflowError::data_source(format!("{} is not valid JSON: {}", url, e))
        })
    }

    fn describe(&self, person_type: PersonType) -> String {
        self.url_for(person_type).to_string()
    }
}

/// Builds the source described by `config`.
///
/// # Errors
///
/// Returns `Config` when one location is a URL and the other a path.
pub fn script_source_from_config(config: &SourceConfig) -> Result<Arc<dyn ScriptSource>> {
    if config.is_remote() {
        return Ok(Arc::new(HttpScriptSource::new(
            config.physical.clone(),
            config.legal_entity.clone(),
        )));
    }
    let remote_count = [&config.physical, &config.legal_entity]
        .iter()
        .filter(|l| l.starts_with("http://") || l.starts_with("https://"))
        .count();
    if remote_count > 0 {
        return Err(ScriptflowError::config(
            "sources must be both local paths or both http(s) URLs",
        ));
    }
    Ok(Arc::new(FileScriptSource::new(
        &config.physical,
        &config.legal_entity,
    )))
}

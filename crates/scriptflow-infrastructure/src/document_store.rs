//! `ScreenDocumentStore` implementations.

use crate::paths::ScriptflowPaths;
use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use scriptflow_core::ScriptflowError;
use scriptflow_core::config::StoreConfig;
use scriptflow_core::error::Result;
use scriptflow_core::screen::{ScreenDefinition, ScreenDocumentStore};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// One JSON file per document, named after the document id.
///
/// Directory structure:
/// ```text
/// root/
/// └── <collection>/
///     ├── abordagem_x.json
///     └── oferta_x.json
/// ```
///
/// Documents are listed in id order.
#[derive(Debug, Clone)]
pub struct JsonDirDocumentStore {
    dir: PathBuf,
}

impl JsonDirDocumentStore {
    /// # Arguments
    ///
    /// * `root` - Store root directory
    /// * `collection` - Collection name, used as the sub-directory
    pub fn new(root: &Path, collection: &str) -> Self {
        Self {
            dir: root.join(collection),
        }
    }

    /// Builds the store described by `config`, defaulting the root to the
    /// platform data directory.
    pub fn from_config(config: &StoreConfig, paths: &ScriptflowPaths) -> Result<Self> {
        let root = match &config.root {
            Some(root) => root.clone(),
            None => paths.default_store_root()?,
        };
        Ok(Self::new(&root, &config.collection))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document(&self, id: &str) -> Result<AtomicJsonFile> {
        let id = id.trim();
        if id.is_empty()
            || id == "."
            || id == ".."
            || id.contains(['/', '\\'])
        {
            return Err(ScriptflowError::persistence(format!(
                "invalid document id '{}'",
                id
            )));
        }
        Ok(AtomicJsonFile::new(self.dir.join(format!("{id}.json"))))
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ScriptflowError::internal(format!("blocking store task failed: {}", e)))?
}

fn read_collection(dir: &Path) -> Result<Vec<ScreenDefinition>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "json")
                && !path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with('.'))
        })
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let file = AtomicJsonFile::new(path);
        match file.load() {
            Ok(Some(value)) => match serde_json::from_value::<ScreenDefinition>(value) {
                Ok(screen) => documents.push(screen),
                Err(e) => {
                    tracing::warn!("[DocumentStore] Skipping {}: {}", file.path().display(), e)
                }
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("[DocumentStore] Skipping {}: {}", file.path().display(), e),
        }
    }
    Ok(documents)
}

fn to_fields(screen: &ScreenDefinition) -> Result<Map<String, Value>> {
    match serde_json::to_value(screen)? {
        Value::Object(map) => Ok(map),
        other => Err(ScriptflowError::internal(format!(
            "screen serialized to non-object {}",
            other
        ))),
    }
}

#[async_trait]
impl ScreenDocumentStore for JsonDirDocumentStore {
    async fn list_all(&self) -> Result<Vec<ScreenDefinition>> {
        let dir = self.dir.clone();
        blocking(move || read_collection(&dir)).await
    }

    async fn upsert(&self, screen: &ScreenDefinition) -> Result<()> {
        let file = self.document(&screen.id)?;
        let fields = to_fields(screen)?;
        blocking(move || file.merge(fields)).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let file = self.document(id)?;
        blocking(move || file.remove()).await
    }
}

/// Process-local store, mainly for tests and store-less sessions that still
/// want edits to survive a reload.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<String, Map<String, Value>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store; each screen is stored under its id.
    pub fn with_screens(screens: impl IntoIterator<Item = ScreenDefinition>) -> Result<Self> {
        let mut documents = BTreeMap::new();
        for screen in screens {
            documents.insert(screen.id.clone(), to_fields(&screen)?);
        }
        Ok(Self {
            documents: RwLock::new(documents),
        })
    }

    /// Raw document stored under `id`.
    pub fn get(&self, id: &str) -> Option<Value> {
        self.documents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .map(Value::Object)
    }

    pub fn ids(&self) -> Vec<String> {
        self.documents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ScreenDocumentStore for InMemoryDocumentStore {
    async fn list_all(&self) -> Result<Vec<ScreenDefinition>> {
        let documents = self.documents.read().unwrap_or_else(|e| e.into_inner());
        documents
            .values()
            .map(|fields| -> Result<ScreenDefinition> {
                Ok(serde_json::from_value(Value::Object(fields.clone()))?)
            })
            .collect()
    }

    async fn upsert(&self, screen: &ScreenDefinition) -> Result<()> {
        let fields = to_fields(screen)?;
        let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
        documents.entry(screen.id.clone()).or_default().extend(fields);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.documents
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
        Ok(())
    }
}

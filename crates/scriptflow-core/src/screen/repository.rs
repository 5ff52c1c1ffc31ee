//! Data source and document store traits.

use super::model::ScreenDefinition;
use crate::error::Result;
use crate::session::PersonType;
use async_trait::async_trait;
use serde_json::Value;

/// A provider of structured script documents, one per person type.
///
/// Implementations must not serve cached content: every call revalidates
/// against the underlying resource.
#[async_trait]
pub trait ScriptSource: Send + Sync {
    /// Fetches the raw `{ "marcas": ... }` document for `person_type`.
    ///
    /// # Errors
    ///
    /// Returns `DataSource` when the resource is unreachable or not JSON.
    async fn fetch(&self, person_type: PersonType) -> Result<Value>;

    /// Human-readable location of the document for `person_type`.
    fn describe(&self, person_type: PersonType) -> String;
}

/// A key-value collection of screen documents.
///
/// Each document represents one `ScreenDefinition`, stored under its id.
#[async_trait]
pub trait ScreenDocumentStore: Send + Sync {
    /// Returns every document of the collection.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec)`: all documents, possibly empty
    /// - `Err(_)`: the collection could not be read
    async fn list_all(&self) -> Result<Vec<ScreenDefinition>>;

    /// Writes `screen` under `screen.id` with merge semantics: top-level
    /// fields present on the stored document but absent from `screen` are
    /// preserved.
    async fn upsert(&self, screen: &ScreenDefinition) -> Result<()>;

    /// Deletes the document stored under `id`. Deleting a missing document
    /// succeeds.
    async fn delete(&self, id: &str) -> Result<()>;
}

//! Builds screen graphs from the configured sources.

use scriptflow_core::ScriptflowError;
use scriptflow_core::error::Result;
use scriptflow_core::screen::{ScreenDocumentStore, ScreenGraph, ScriptSource, inject_system_screens};
use scriptflow_core::session::PersonType;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Sequence number of one load. Only the most recently issued ticket may
/// apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// Loads graphs from the structured documents or the remote collection.
pub struct GraphLoader {
    source: Arc<dyn ScriptSource>,
    store: Option<Arc<dyn ScreenDocumentStore>>,
    timeout: Duration,
    latest: AtomicU64,
}

impl GraphLoader {
    pub fn new(source: Arc<dyn ScriptSource>, timeout: Duration) -> Self {
        Self {
            source,
            store: None,
            timeout,
            latest: AtomicU64::new(0),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ScreenDocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Takes the next ticket, superseding every ticket issued before.
    pub fn issue_ticket(&self) -> LoadTicket {
        LoadTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether no newer load was started after `ticket`.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Fetches and normalizes the document for `person_type`, then injects
    /// the system screens.
    ///
    /// # Errors
    ///
    /// `DataSource` when the fetch fails, times out, or the document has no
    /// `marcas` object.
    pub async fn load_graph(&self, person_type: PersonType) -> Result<ScreenGraph> {
        let location = self.source.describe(person_type);
        let document = self
            .bounded(&location, self.source.fetch(person_type))
            .await?;

        let mut graph = ScreenGraph::from_document(&document)?;
        inject_system_screens(&mut graph);

        tracing::info!(
            "[GraphLoader] Loaded {} screens, {} products from {}",
            graph.len(),
            graph.products().len(),
            location
        );
        Ok(graph)
    }

    /// Builds a graph from the remote collection.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(graph))`: the collection had documents
    /// - `Ok(None)`: no store is attached or the collection is empty
    /// - `Err(_)`: the collection could not be read
    pub async fn load_graph_from_store(&self) -> Result<Option<ScreenGraph>> {
        let Some(store) = &self.store else {
            return Ok(None);
        };

        let documents = self.bounded("document store", store.list_all()).await?;
        if documents.is_empty() {
            tracing::info!("[GraphLoader] Document store is empty");
            return Ok(None);
        }

        let mut graph = ScreenGraph::from_documents(documents);
        inject_system_screens(&mut graph);

        tracing::info!(
            "[GraphLoader] Loaded {} screens, {} products from document store",
            graph.len(),
            graph.products().len()
        );
        Ok(Some(graph))
    }

    async fn bounded<T>(&self, what: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ScriptflowError::data_source(format!(
                "{} did not answer within {}s",
                what,
                self.timeout.as_secs_f32()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scriptflow_core::screen::{ScreenDefinition, START_SCREEN_ID};
    use scriptflow_infrastructure::InMemoryDocumentStore;
    use serde_json::{Value, json};

    struct StaticSource {
        document: Value,
        delay: Duration,
    }

    #[async_trait]
    impl ScriptSource for StaticSource {
        async fn fetch(&self, _person_type: PersonType) -> Result<Value> {
            tokio::time::sleep(self.delay).await;
            Ok(self.document.clone())
        }

        fn describe(&self, person_type: PersonType) -> String {
            format!("static:{}", person_type)
        }
    }

    fn loader(document: Value, delay: Duration) -> GraphLoader {
        GraphLoader::new(
            Arc::new(StaticSource { document, delay }),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_load_graph_injects_system_screens() {
        let loader = loader(
            json!({"marcas": {"X": {"abordagem": {"id": "x1", "title": "A", "body": "", "buttons": []}}}}),
            Duration::ZERO,
        );

        let graph = loader.load_graph(PersonType::Physical).await.unwrap();

        assert!(graph.contains(START_SCREEN_ID));
        assert_eq!(graph.entry_for("X"), Some("x1"));
    }

    #[tokio::test]
    async fn test_missing_brands_is_data_source_error() {
        let loader = loader(json!({"other": {}}), Duration::ZERO);
        assert!(loader.load_graph(PersonType::Physical).await.unwrap_err().is_data_source());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out() {
        let loader = loader(json!({"marcas": {}}), Duration::from_secs(60));
        let err = loader.load_graph(PersonType::LegalEntity).await.unwrap_err();
        assert!(err.is_data_source());
    }

    #[tokio::test]
    async fn test_store_graph_uses_document_ids_and_product_order() {
        let store = InMemoryDocumentStore::with_screens(vec![
            ScreenDefinition::new("a_intro", "Intro", "").with_product("X"),
            ScreenDefinition::new("b_offer", "Offer", "").with_product("X"),
            ScreenDefinition::new("c_misc", "Misc", ""),
        ])
        .unwrap();
        let loader = loader(json!({}), Duration::ZERO).with_store(Arc::new(store));

        let graph = loader.load_graph_from_store().await.unwrap().unwrap();

        assert_eq!(graph.entry_for("X"), Some("a_intro"));
        assert!(graph.contains("c_misc"));
        assert!(graph.contains(START_SCREEN_ID));
    }

    #[tokio::test]
    async fn test_empty_or_absent_store_is_none() {
        let without = loader(json!({}), Duration::ZERO);
        assert!(without.load_graph_from_store().await.unwrap().is_none());

        let with_empty =
            loader(json!({}), Duration::ZERO).with_store(Arc::new(InMemoryDocumentStore::new()));
        assert!(with_empty.load_graph_from_store().await.unwrap().is_none());
    }

    #[test]
    fn test_only_latest_ticket_is_current() {
        let loader = loader(json!({}), Duration::ZERO);
        let first = loader.issue_ticket();
        let second = loader.issue_ticket();
        assert!(!loader.is_current(first));
        assert!(loader.is_current(second));
        assert!(first < second);
    }
}

//! Script viewer use case.
//!
//! `ScriptViewer` wires the navigation engine to the loaders and the
//! auto-save path. Adapters (the CLI REPL) call these operations and render
//! through `SessionObserver` hooks.

use crate::auto_save::{AutoSaveBridge, AutoSaveStats};
use crate::graph_loader::GraphLoader;
use scriptflow_core::admin::{
    AdminEditSession, AppliedEdit, ButtonRow, EditBuffer, NoopScheduler, PersistenceScheduler,
};
use scriptflow_core::config::RootConfig;
use scriptflow_core::error::Result;
use scriptflow_core::screen::{START_SCREEN_ID, ScreenDefinition, ScreenDocumentStore, ScreenGraph};
use scriptflow_core::session::{
    ButtonAction, NavigationOutcome, PersonType, Progress, ServiceType, SessionContext,
    SessionObserver,
};
use scriptflow_infrastructure::{JsonDirDocumentStore, ScriptflowPaths, script_source_from_config};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Where the graph shown after bootstrap came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphOrigin {
    Store,
    LocalDocument,
}

/// Whether a finished load replaced the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load was started meanwhile; this result was dropped.
    Superseded,
}

/// One agent session over a script graph.
///
/// Lock order is always context, then admin session.
pub struct ScriptViewer {
    loader: GraphLoader,
    context: Arc<RwLock<SessionContext>>,
    admin: Mutex<AdminEditSession>,
    autosave: Option<AutoSaveBridge>,
}

impl ScriptViewer {
    /// Creates a viewer over an empty graph; call [`ScriptViewer::bootstrap`]
    /// before navigating.
    pub fn new(loader: GraphLoader, autosave: Option<AutoSaveBridge>) -> Self {
        let scheduler: Arc<dyn PersistenceScheduler> = match &autosave {
            Some(bridge) => Arc::new(bridge.clone()),
            None => Arc::new(NoopScheduler),
        };
        Self {
            loader,
            context: Arc::new(RwLock::new(SessionContext::new(ScreenGraph::default()))),
            admin: Mutex::new(AdminEditSession::new(scheduler)),
            autosave,
        }
    }

    /// Wires sources, store and auto-save from `config`.
    pub fn from_config(config: &RootConfig, paths: &ScriptflowPaths) -> anyhow::Result<Self> {
        let source = script_source_from_config(&config.sources)?;
        let mut loader = GraphLoader::new(
            source,
            Duration::from_secs(config.loader.fetch_timeout_secs),
        );

        let mut autosave = None;
        if config.store.enabled {
            let store: Arc<dyn ScreenDocumentStore> =
                Arc::new(JsonDirDocumentStore::from_config(&config.store, paths)?);
            tracing::info!(
                "[ScriptViewer] Document store enabled (collection '{}')",
                config.store.collection
            );
            loader = loader.with_store(store.clone());
            autosave = Some(AutoSaveBridge::from_config(store, &config.autosave));
        }

        Ok(Self::new(loader, autosave))
    }

    pub async fn add_observer(&self, observer: Arc<dyn SessionObserver>) {
        self.context.write().await.add_observer(observer);
    }

    /// Runs `f` against the session under the read lock.
    pub async fn with_context<R>(&self, f: impl FnOnce(&SessionContext) -> R) -> R {
        f(&*self.context.read().await)
    }

    // ============================================================================
    // Loading
    // ============================================================================

    /// Loads the initial graph and shows the start screen.
    ///
    /// The remote collection wins when it has documents; an empty or failing
    /// store falls back to the local physical-person document.
    pub async fn bootstrap(&self) -> Result<GraphOrigin> {
        let ticket = self.loader.issue_ticket();

        let (graph, origin) = match self.loader.load_graph_from_store().await {
            Ok(Some(graph)) => (graph, GraphOrigin::Store),
            Ok(None) => (
                self.loader.load_graph(PersonType::Physical).await?,
                GraphOrigin::LocalDocument,
            ),
            Err(e) => {
                tracing::warn!("[ScriptViewer] Document store unavailable, using local document: {}", e);
                (
                    self.loader.load_graph(PersonType::Physical).await?,
                    GraphOrigin::LocalDocument,
                )
            }
        };

        let mut ctx = self.context.write().await;
        if !self.loader.is_current(ticket) {
            tracing::debug!("[ScriptViewer] Bootstrap load superseded, discarded");
            return Ok(origin);
        }
        ctx.replace_graph(graph);
        ctx.reset_session();
        ctx.goto(START_SCREEN_ID);
        tracing::info!("[ScriptViewer] Session {} started from {:?}", ctx.id(), origin);
        Ok(origin)
    }

    /// Records the person type and swaps in its graph.
    ///
    /// The selection applies at once; the graph follows when its load
    /// completes, unless another load started meanwhile. On error the
    /// previous graph stays.
    pub async fn select_person_type(&self, person_type: PersonType) -> Result<LoadOutcome> {
        let ticket = self.loader.issue_ticket();
        self.context.write().await.select_person_type(person_type);

        let graph = self.loader.load_graph(person_type).await?;

        let mut ctx = self.context.write().await;
        if !self.loader.is_current(ticket) {
            tracing::debug!(
                "[ScriptViewer] Discarded stale '{}' graph",
                person_type.as_selector()
            );
            return Ok(LoadOutcome::Superseded);
        }
        ctx.replace_graph(graph);
        Ok(LoadOutcome::Applied)
    }

    /// Clears the session, reloads the default graph and shows the start
    /// screen. The unsaved edit buffer is discarded.
    ///
    /// On load failure nothing changes and the error is returned.
    pub async fn hard_reset(&self) -> Result<()> {
        let ticket = self.loader.issue_ticket();
        let graph = self.loader.load_graph(PersonType::Physical).await?;

        let mut ctx = self.context.write().await;
        self.admin.lock().await.discard();
        if self.loader.is_current(ticket) {
            ctx.replace_graph(graph);
        } else {
            tracing::debug!("[ScriptViewer] Reset load superseded, keeping current graph");
        }
        ctx.reset_session();
        ctx.goto(START_SCREEN_ID);
        tracing::info!("[ScriptViewer] Session reset");
        Ok(())
    }

    // ============================================================================
    // Selections and navigation
    // ============================================================================

    pub async fn select_service_type(&self, service_type: ServiceType) {
        self.context.write().await.select_service_type(service_type);
    }

    pub async fn select_product(&self, product: &str) -> Result<()> {
        self.context.write().await.select_product(product)
    }

    pub async fn start(&self) -> Result<NavigationOutcome> {
        self.context.write().await.start()
    }

    /// Dispatches button `index` of the current screen, running the hard
    /// reset when the button asks for one.
    pub async fn press_button(&self, index: usize) -> Result<ButtonAction> {
        let action = self.context.write().await.press_button(index)?;
        if action == ButtonAction::ResetRequested {
            self.hard_reset().await?;
        }
        Ok(action)
    }

    pub async fn goto(&self, id: &str) -> NavigationOutcome {
        self.context.write().await.goto(id)
    }

    pub async fn back(&self) -> NavigationOutcome {
        self.context.write().await.back()
    }

    pub async fn find(&self, term: &str) -> Result<NavigationOutcome> {
        self.context.write().await.find_and_goto(term)
    }

    pub async fn jump_list(&self) -> Vec<(String, String)> {
        self.context.read().await.jump_list()
    }

    pub async fn progress(&self) -> Progress {
        self.context.read().await.progress()
    }

    pub async fn current_screen(&self) -> Option<ScreenDefinition> {
        self.context.read().await.current_screen().cloned()
    }

    // ============================================================================
    // Admin editing
    // ============================================================================

    /// Binds the edit form to `id`. `None` if the screen doesn't exist.
    pub async fn begin_edit(&self, id: &str) -> Option<EditBuffer> {
        let ctx = self.context.read().await;
        self.admin.lock().await.begin_edit(&ctx, id).cloned()
    }

    pub async fn edit_buffer(&self) -> Option<EditBuffer> {
        self.admin.lock().await.buffer().cloned()
    }

    /// Mutates the bound form. Returns `false` when nothing is bound.
    pub async fn update_buffer(&self, f: impl FnOnce(&mut EditBuffer)) -> bool {
        match self.admin.lock().await.buffer_mut() {
            Some(buffer) => {
                f(buffer);
                true
            }
            None => false,
        }
    }

    pub async fn add_button_row(&self) -> bool {
        self.update_buffer(EditBuffer::add_button_row).await
    }

    pub async fn remove_button_row(&self, index: usize) -> Option<ButtonRow> {
        self.admin
            .lock()
            .await
            .buffer_mut()
            .and_then(|b| b.remove_button_row(index))
    }

    pub async fn discard_edit(&self) {
        self.admin.lock().await.discard();
    }

    /// Applies the bound form; persistence is scheduled, not awaited.
    pub async fn apply_edit(&self) -> Result<AppliedEdit> {
        let mut ctx = self.context.write().await;
        self.admin.lock().await.apply_pending(&mut ctx)
    }

    pub async fn delete_screen(&self, id: &str) -> Result<ScreenDefinition> {
        let mut ctx = self.context.write().await;
        self.admin.lock().await.delete_screen(&mut ctx, id)
    }

    /// Forces pending auto-save writes out. Returns how many ran.
    pub async fn flush(&self) -> usize {
        match &self.autosave {
            Some(bridge) => bridge.flush().await,
            None => 0,
        }
    }

    pub fn autosave_stats(&self) -> Option<AutoSaveStats> {
        self.autosave.as_ref().map(AutoSaveBridge::stats)
    }
}

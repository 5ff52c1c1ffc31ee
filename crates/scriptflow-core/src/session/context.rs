//! Navigation engine.
//!
//! `SessionContext` owns everything one agent session mutates: the screen
//! graph, the history stack, the selections and the set of screen instances
//! already constructed. One context is created per active session.

use super::history::HistoryStack;
use super::model::{PersonType, ServiceType, SessionState};
use super::observer::SessionObserver;
use super::progress::{Progress, compute_progress};
use crate::error::{Result, ScriptflowError};
use crate::screen::{
    END_SCREEN_ID, RESET_LABEL, START_SCREEN_ID, START_SENTINEL, ScreenDefinition, ScreenGraph,
};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const MSG_SELECT_PRODUCT: &str = "Selecione um produto válido para iniciar.";
const MSG_SELECT_SERVICE_AND_PERSON: &str = "Selecione o tipo de atendimento e a pessoa para iniciar.";

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The target was pushed and activated.
    Moved {
        id: String,
        /// The screen instance was constructed by this navigation.
        first_visit: bool,
    },
    /// The target does not exist; nothing changed.
    Ignored,
}

impl NavigationOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// What pressing a screen button did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Navigated(NavigationOutcome),
    /// The button asks for a full reset, which reloads data and is carried
    /// out by the caller.
    ResetRequested,
}

pub struct SessionContext {
    id: Uuid,
    graph: ScreenGraph,
    history: HistoryStack,
    state: SessionState,
    instances: HashSet<String>,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl SessionContext {
    pub fn new(graph: ScreenGraph) -> Self {
        Self {
            id: Uuid::new_v4(),
            graph,
            history: HistoryStack::new(),
            state: SessionState::default(),
            instances: HashSet::new(),
            observers: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn add_observer(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn graph(&self) -> &ScreenGraph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut ScreenGraph {
        &mut self.graph
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_id(&self) -> Option<&str> {
        self.history.current()
    }

    /// The current screen, if the last history entry still resolves.
    pub fn current_screen(&self) -> Option<&ScreenDefinition> {
        self.history.current().and_then(|id| self.graph.get(id))
    }

    /// Whether a view instance was already constructed for `id`.
    pub fn has_instance(&self, id: &str) -> bool {
        self.instances.contains(id)
    }

    pub fn progress(&self) -> Progress {
        compute_progress(&self.history, &self.graph, self.state.product.as_deref())
    }

    /// Product lines offered on the start screen.
    pub fn products(&self) -> Vec<&str> {
        self.graph.products()
    }

    // ============================================================================
    // Navigation
    // ============================================================================

    /// Navigates to `id`.
    ///
    /// Unknown ids are ignored silently: they come from stale references
    /// (deleted screens, dangling button targets).
    pub fn goto(&mut self, id: &str) -> NavigationOutcome {
        if !self.graph.contains(id) {
            tracing::debug!("[Navigation] Ignoring unknown screen '{}'", id);
            return NavigationOutcome::Ignored;
        }

        let first_visit = self.instances.insert(id.to_string());
        self.history.push(id);
        self.notify_screen_changed();

        NavigationOutcome::Moved {
            id: id.to_string(),
            first_visit,
        }
    }

    /// Pops the current entry and the one before it, then navigates to that
    /// prior entry as a fresh visit (re-pushing it).
    ///
    /// Falls back to the start screen when the stack underflows or the prior
    /// entry no longer exists.
    pub fn back(&mut self) -> NavigationOutcome {
        self.history.pop();
        let prior = self
            .history
            .pop()
            .filter(|id| self.graph.contains(id))
            .unwrap_or_else(|| START_SCREEN_ID.to_string());
        self.goto(&prior)
    }

    /// Enters `product` at its entry screen.
    ///
    /// # Errors
    ///
    /// Returns `Validation` without changing state when the service type or
    /// person type is unset, or when `product` has no known entry screen.
    pub fn select_entry_for_product(&mut self, product: &str) -> Result<NavigationOutcome> {
        if self.state.service_type.is_none() || self.state.person_type.is_none() {
            return Err(ScriptflowError::validation(MSG_SELECT_SERVICE_AND_PERSON));
        }
        let entry = self
            .graph
            .entry_for(product)
            .map(str::to_string)
            .ok_or_else(|| ScriptflowError::validation(MSG_SELECT_PRODUCT))?;

        self.state.product = Some(product.to_string());
        Ok(self.goto(&entry))
    }

    /// Enters the currently selected product.
    pub fn start(&mut self) -> Result<NavigationOutcome> {
        let product = self
            .state
            .product
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ScriptflowError::validation(MSG_SELECT_PRODUCT))?;
        self.select_entry_for_product(&product)
    }

    /// Dispatches button `index` of the current screen.
    ///
    /// Start-screen `__start` enters the selected product; the start screen's
    /// reset button and the end screen's return button request a reset; every
    /// other button navigates to its target.
    pub fn press_button(&mut self, index: usize) -> Result<ButtonAction> {
        let Some(screen) = self.current_screen() else {
            return Ok(ButtonAction::Navigated(NavigationOutcome::Ignored));
        };
        let Some(button) = screen.buttons.get(index) else {
            return Ok(ButtonAction::Navigated(NavigationOutcome::Ignored));
        };

        let on_start = screen.id == START_SCREEN_ID;
        let on_end = screen.id == END_SCREEN_ID;
        let is_reset_label = button.label == RESET_LABEL;
        let target = button.target().map(str::to_string);

        if on_start && target.as_deref() == Some(START_SENTINEL) {
            return self.start().map(ButtonAction::Navigated);
        }
        if (on_start && is_reset_label) || (on_end && target.as_deref() == Some(START_SCREEN_ID)) {
            return Ok(ButtonAction::ResetRequested);
        }

        Ok(ButtonAction::Navigated(match target {
            Some(target) => self.goto(&target),
            None => NavigationOutcome::Ignored,
        }))
    }

    /// History entries that still resolve, with their titles, oldest first.
    pub fn jump_list(&self) -> Vec<(String, String)> {
        self.history
            .iter()
            .filter_map(|id| self.graph.get(id))
            .map(|s| (s.id.clone(), s.title.clone()))
            .collect()
    }

    /// First screen whose title or body contains `term`, ignoring case.
    pub fn find_screen(&self, term: &str) -> Option<&ScreenDefinition> {
        self.graph.find(term)
    }

    /// Navigates to the first screen matching `term`.
    pub fn find_and_goto(&mut self, term: &str) -> Result<NavigationOutcome> {
        let id = self
            .find_screen(term)
            .map(|s| s.id.clone())
            .ok_or_else(|| {
                ScriptflowError::validation(format!("Nenhuma tela encontrada para: {}", term.trim()))
            })?;
        Ok(self.goto(&id))
    }

    // ============================================================================
    // Selections
    // ============================================================================

    pub fn select_service_type(&mut self, service_type: ServiceType) {
        self.state.service_type = Some(service_type);
    }

    /// Records the person type and clears the product, whose list depends on
    /// the document loaded for that person type.
    pub fn select_person_type(&mut self, person_type: PersonType) {
        self.state.person_type = Some(person_type);
        self.state.product = None;
    }

    /// # Errors
    ///
    /// Returns `Validation` when `product` is not offered by the current graph.
    pub fn select_product(&mut self, product: &str) -> Result<()> {
        if !self.graph.products().contains(&product) {
            return Err(ScriptflowError::validation(MSG_SELECT_PRODUCT));
        }
        self.state.product = Some(product.to_string());
        Ok(())
    }

    // ============================================================================
    // Lifecycle
    // ============================================================================

    /// Swaps in a freshly built graph. Instances of screens that disappeared
    /// are dropped; history is kept.
    pub fn replace_graph(&mut self, graph: ScreenGraph) {
        self.graph = graph;
        let graph = &self.graph;
        self.instances.retain(|id| graph.contains(id));
        for observer in &self.observers {
            observer.on_graph_rebuilt(&self.graph);
        }
    }

    /// Clears history, selections and constructed instances.
    pub fn reset_session(&mut self) {
        self.history.clear();
        self.state.clear();
        self.instances.clear();
    }

    // ============================================================================
    // Admin support
    // ============================================================================

    /// Re-keys a screen and rewrites history entries that pointed at it.
    pub(crate) fn rename_screen(&mut self, old_id: &str, new_id: &str) -> Result<()> {
        self.graph.rename(old_id, new_id)?;

        if self.instances.remove(old_id) {
            self.instances.insert(new_id.to_string());
        }
        if self.history.iter().any(|id| id == old_id) {
            self.history = self
                .history
                .iter()
                .map(|id| if id == old_id { new_id } else { id })
                .collect();
        }
        Ok(())
    }

    /// Removes a screen from the graph. History is left as is.
    pub(crate) fn remove_screen(&mut self, id: &str) -> Option<ScreenDefinition> {
        self.instances.remove(id);
        self.graph.remove(id)
    }

    /// Rebuilds the view of `id`, notifying observers if it is on display.
    pub(crate) fn refresh_screen(&mut self, id: &str) {
        if !self.graph.contains(id) {
            return;
        }
        self.instances.insert(id.to_string());
        if self.history.current() == Some(id) {
            self.notify_screen_changed();
        }
    }

    fn notify_screen_changed(&self) {
        if self.observers.is_empty() {
            return;
        }
        let Some(screen) = self.current_screen() else {
            return;
        };
        let progress = self.progress();
        for observer in &self.observers {
            observer.on_screen_changed(screen, &progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::{NOT_CONFIRMED_SCREEN_ID, ScreenButton, inject_system_screens};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        screens: Mutex<Vec<String>>,
        rebuilds: Mutex<usize>,
    }

    impl SessionObserver for RecordingObserver {
        fn on_screen_changed(&self, screen: &ScreenDefinition, _progress: &Progress) {
            self.screens.lock().unwrap().push(screen.id.clone());
        }

        fn on_graph_rebuilt(&self, _graph: &ScreenGraph) {
            *self.rebuilds.lock().unwrap() += 1;
        }
    }

    fn legal_entity_graph() -> ScreenGraph {
        let mut graph = ScreenGraph::from_document(&json!({
            "marcas": {
                "X": {
                    "abordagem": {
                        "id": "x1",
                        "title": "Abordagem X",
                        "buttons": [
                            { "label": "Confirma", "next": "x2", "primary": true },
                            { "label": "Não confirma", "next": "nao_confirma" },
                            { "label": "Quebrado", "next": "does-not-exist" },
                            { "label": "Sem destino" }
                        ]
                    },
                    "oferta": { "id": "x2", "title": "Oferta X", "buttons": [{ "label": "Fim", "next": "fim" }] }
                },
                "Y": { "abordagem": { "id": "y1", "title": "Abordagem Y" } }
            }
        }))
        .unwrap();
        inject_system_screens(&mut graph);
        graph
    }

    fn ready_context() -> SessionContext {
        let mut ctx = SessionContext::new(legal_entity_graph());
        ctx.goto(START_SCREEN_ID);
        ctx.select_service_type(ServiceType::Receptive);
        ctx.select_person_type(PersonType::LegalEntity);
        ctx
    }

    fn history_of(ctx: &SessionContext) -> Vec<&str> {
        ctx.history().iter().collect()
    }

    #[test]
    fn test_goto_pushes_and_tracks_instances() {
        let mut ctx = SessionContext::new(legal_entity_graph());
        assert_eq!(
            ctx.goto("x1"),
            NavigationOutcome::Moved { id: "x1".to_string(), first_visit: true }
        );
        assert_eq!(
            ctx.goto("x1"),
            NavigationOutcome::Moved { id: "x1".to_string(), first_visit: false }
        );
        assert_eq!(history_of(&ctx), vec!["x1", "x1"]);
        assert!(ctx.has_instance("x1"));
    }

    #[test]
    fn test_goto_unknown_is_noop() {
        let mut ctx = SessionContext::new(legal_entity_graph());
        ctx.goto("x1");
        assert_eq!(ctx.goto("missing"), NavigationOutcome::Ignored);
        assert_eq!(history_of(&ctx), vec!["x1"]);
    }

    #[test]
    fn test_back_pops_twice_then_revisits() {
        let mut ctx = SessionContext::new(legal_entity_graph());
        ctx.goto("x1");
        ctx.goto("x2");
        ctx.goto(NOT_CONFIRMED_SCREEN_ID);

        let outcome = ctx.back();

        assert_eq!(
            outcome,
            NavigationOutcome::Moved { id: "x2".to_string(), first_visit: false }
        );
        assert_eq!(history_of(&ctx), vec!["x1", "x2"]);
        assert_eq!(ctx.current_id(), Some("x2"));
    }

    #[test]
    fn test_back_underflow_goes_to_start() {
        let mut ctx = SessionContext::new(legal_entity_graph());
        ctx.goto("x1");
        ctx.back();
        assert_eq!(history_of(&ctx), vec![START_SCREEN_ID]);
    }

    #[test]
    fn test_select_entry_for_product() {
        let mut ctx = ready_context();
        let outcome = ctx.select_entry_for_product("X").unwrap();
        assert_eq!(outcome, NavigationOutcome::Moved { id: "x1".to_string(), first_visit: true });
        assert_eq!(ctx.current_id(), Some("x1"));
        assert_eq!(ctx.state().product.as_deref(), Some("X"));
    }

    #[test]
    fn test_select_entry_requires_selections() {
        let mut ctx = SessionContext::new(legal_entity_graph());
        ctx.goto(START_SCREEN_ID);
        let err = ctx.select_entry_for_product("X").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(history_of(&ctx), vec![START_SCREEN_ID]);
    }

    #[test]
    fn test_select_entry_unknown_product() {
        let mut ctx = ready_context();
        let err = ctx.select_entry_for_product("Z").unwrap_err();
        assert!(err.is_validation());
        assert!(ctx.state().product.is_none());
    }

    #[test]
    fn test_start_button_enters_selected_product() {
        let mut ctx = ready_context();
        ctx.select_product("Y").unwrap();
        let action = ctx.press_button(0).unwrap();
        assert_eq!(
            action,
            ButtonAction::Navigated(NavigationOutcome::Moved { id: "y1".to_string(), first_visit: true })
        );
    }

    #[test]
    fn test_start_button_without_product_is_blocked() {
        let mut ctx = ready_context();
        assert!(ctx.press_button(0).unwrap_err().is_validation());
    }

    #[test]
    fn test_reset_buttons_request_reset() {
        let mut ctx = ready_context();
        assert_eq!(ctx.press_button(1).unwrap(), ButtonAction::ResetRequested);

        ctx.goto(END_SCREEN_ID);
        assert_eq!(ctx.press_button(0).unwrap(), ButtonAction::ResetRequested);
    }

    #[test]
    fn test_data_buttons_navigate_or_ignore() {
        let mut ctx = ready_context();
        ctx.select_entry_for_product("X").unwrap();

        assert_eq!(
            ctx.press_button(2).unwrap(),
            ButtonAction::Navigated(NavigationOutcome::Ignored)
        );
        assert_eq!(
            ctx.press_button(3).unwrap(),
            ButtonAction::Navigated(NavigationOutcome::Ignored)
        );
        assert_eq!(
            ctx.press_button(9).unwrap(),
            ButtonAction::Navigated(NavigationOutcome::Ignored)
        );
        assert!(matches!(
            ctx.press_button(1).unwrap(),
            ButtonAction::Navigated(NavigationOutcome::Moved { ref id, .. }) if id == NOT_CONFIRMED_SCREEN_ID
        ));
    }

    #[test]
    fn test_select_person_type_clears_product() {
        let mut ctx = ready_context();
        ctx.select_product("X").unwrap();
        ctx.select_person_type(PersonType::Physical);
        assert!(ctx.state().product.is_none());
    }

    #[test]
    fn test_select_unknown_product_rejected() {
        let mut ctx = ready_context();
        assert!(ctx.select_product("Nope").unwrap_err().is_validation());
    }

    #[test]
    fn test_deleted_screen_goto_keeps_last_valid_screen() {
        let mut ctx = ready_context();
        ctx.select_entry_for_product("X").unwrap();
        ctx.goto("x2");
        ctx.remove_screen("x2");

        assert_eq!(ctx.goto("x2"), NavigationOutcome::Ignored);
        assert_eq!(ctx.current_id(), Some("x2"));
        assert!(ctx.current_screen().is_none());
        assert_eq!(
            ctx.jump_list(),
            vec![
                (START_SCREEN_ID.to_string(), "Início".to_string()),
                ("x1".to_string(), "Abordagem X".to_string())
            ]
        );
    }

    #[test]
    fn test_observer_notified() {
        let observer = Arc::new(RecordingObserver::default());
        let mut ctx = SessionContext::new(legal_entity_graph());
        ctx.add_observer(observer.clone());

        ctx.goto("x1");
        ctx.goto("missing");
        ctx.replace_graph(legal_entity_graph());

        assert_eq!(*observer.screens.lock().unwrap(), vec!["x1".to_string()]);
        assert_eq!(*observer.rebuilds.lock().unwrap(), 1);
    }

    #[test]
    fn test_rename_rewrites_history() {
        let mut ctx = SessionContext::new(legal_entity_graph());
        ctx.goto("x1");
        ctx.goto("x2");
        ctx.rename_screen("x2", "oferta").unwrap();

        assert_eq!(history_of(&ctx), vec!["x1", "oferta"]);
        assert!(ctx.has_instance("oferta"));
        assert!(!ctx.has_instance("x2"));
    }

    #[test]
    fn test_find_and_goto() {
        let mut ctx = SessionContext::new(legal_entity_graph());
        assert!(ctx.find_and_goto("oferta").unwrap().is_moved());
        assert_eq!(ctx.current_id(), Some("x2"));
        assert!(ctx.find_and_goto("zzz").unwrap_err().is_validation());
    }

    #[test]
    fn test_reset_session_clears_everything() {
        let mut ctx = ready_context();
        ctx.select_entry_for_product("X").unwrap();
        ctx.reset_session();
        assert!(ctx.history().is_empty());
        assert_eq!(ctx.state(), &SessionState::default());
        assert!(!ctx.has_instance("x1"));
    }

    #[test]
    fn test_button_targets_survive_in_graph() {
        let ctx = SessionContext::new(legal_entity_graph());
        let x1 = ctx.graph().get("x1").unwrap();
        assert_eq!(x1.buttons[0], ScreenButton::new("Confirma", "x2").primary());
    }
}

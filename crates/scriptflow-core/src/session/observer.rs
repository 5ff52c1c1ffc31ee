//! Presentation hooks.
//!
//! The engine never reaches into a view. Adapters register an observer and
//! redraw from what it receives.

use super::progress::Progress;
use crate::screen::{ScreenDefinition, ScreenGraph};

pub trait SessionObserver: Send + Sync {
    /// Called after every successful navigation and after the active screen
    /// is rebuilt by an admin edit.
    fn on_screen_changed(&self, _screen: &ScreenDefinition, _progress: &Progress) {}

    /// Called after the whole graph was replaced by a reload.
    fn on_graph_rebuilt(&self, _graph: &ScreenGraph) {}
}

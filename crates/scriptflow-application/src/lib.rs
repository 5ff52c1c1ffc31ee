//! Application layer for Scriptflow.
//!
//! - `graph_loader`: dual-source graph loading with load sequencing
//! - `auto_save`: per-screen debounced persistence of admin edits
//! - `viewer`: the `ScriptViewer` use case driving one agent session

pub mod auto_save;
pub mod graph_loader;
pub mod viewer;

pub use auto_save::{AUTOSAVE_TARGET, AutoSaveBridge, AutoSaveStats};
pub use graph_loader::{GraphLoader, LoadTicket};
pub use viewer::{GraphOrigin, LoadOutcome, ScriptViewer};

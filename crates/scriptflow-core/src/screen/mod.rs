//! Screen domain module.
//!
//! - `model`: `ScreenDefinition` and its buttons and presentation overrides
//! - `graph`: the flat screen map, entry index and document normalization
//! - `system`: reserved control screens
//! - `repository`: script source and document store traits

mod graph;
mod model;
mod repository;
mod system;

pub use graph::{APPROACH_KEY, BRANDS_KEY, ProductEntryIndex, ScreenGraph};
pub use model::{
    DEFAULT_FONT_SIZE_BODY, DEFAULT_FONT_SIZE_BUTTONS, DEFAULT_FONT_SIZE_TITLE,
    DEFAULT_PADDING_BODY, NO_DISPOSITION, ScreenButton, ScreenDefinition, ScreenStyle, px_value,
};
pub use repository::{ScreenDocumentStore, ScriptSource};
pub use system::{
    END_SCREEN_ID, NOT_CONFIRMED_SCREEN_ID, RESERVED_SCREEN_IDS, RESET_LABEL, START_SCREEN_ID,
    START_SENTINEL, inject_system_screens, is_reserved, system_screens,
};

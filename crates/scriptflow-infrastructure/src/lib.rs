//! Infrastructure layer for Scriptflow: script sources, document stores,
//! configuration and paths.

pub mod config_service;
pub mod document_store;
pub mod paths;
pub mod script_source;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::document_store::{InMemoryDocumentStore, JsonDirDocumentStore};
pub use crate::paths::ScriptflowPaths;
pub use crate::script_source::{FileScriptSource, HttpScriptSource, script_source_from_config};

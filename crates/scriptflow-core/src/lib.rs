//! Domain layer for Scriptflow.
//!
//! Screen graph, navigation engine, progress and admin editing. No I/O
//! happens here: data sources and stores are traits implemented by
//! `scriptflow-infrastructure`.

pub mod admin;
pub mod config;
pub mod error;
pub mod screen;
pub mod session;

pub use error::{Result, ScriptflowError};

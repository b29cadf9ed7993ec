//! Hierarchical note store: a document tree of directories and files, flag
//! trees that shadow it, and save orchestration over pluggable storage.

pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod model;
pub mod provider;
pub mod state;
pub mod ui;

pub use error::{NoteError, Result};

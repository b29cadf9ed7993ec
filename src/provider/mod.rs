//! Storage providers.
//!
//! A [`Provider`] persists the document tree on some medium. The session
//! calls it before applying a mutation locally and applies the confirmed
//! result only on success. Provider errors are surfaced unchanged.

pub mod json_file;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Node, NodeName, NodePath};

pub use json_file::JsonFileProvider;
pub use memory::MemoryProvider;

/// Confirmation of an insert. The provider may adjust the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inserted {
    pub parent: NodePath,
    pub node: Node,
}

/// Confirmation of a rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renamed {
    pub old_path: NodePath,
    pub new_name: NodeName,
}

/// Confirmation of a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Moved {
    pub old_path: NodePath,
    pub new_path: NodePath,
}

/// Capability interface every storage backend implements.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Load all top-level nodes.
    async fn fetch_all(&self) -> Result<Vec<Node>>;

    /// Add `node` to the directory at `parent`.
    async fn insert(&self, parent: &[NodeName], node: Node) -> Result<Inserted>;

    /// Rename the node at `path`.
    async fn rename(&self, path: &[NodeName], new_name: &str) -> Result<Renamed>;

    /// Delete the node at `path` and return the confirmed path.
    async fn delete(&self, path: &[NodeName]) -> Result<NodePath>;

    /// Move the node at `path` into the directory at `new_parent`.
    async fn move_node(&self, path: &[NodeName], new_parent: &[NodeName]) -> Result<Moved>;

    /// Persist the content of the file at `path`.
    async fn set_content(&self, path: &[NodeName], content: String) -> Result<()>;
}

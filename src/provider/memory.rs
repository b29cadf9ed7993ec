use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Inserted, Moved, Provider, Renamed};
use crate::error::Result;
use crate::model::path::NodePath;
use crate::model::{Directory, Node, NodeName};

/// Provider keeping the document in memory.
#[derive(Debug)]
pub struct MemoryProvider {
    root: Mutex<Directory>,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::with_root(Directory::root())
    }

    pub fn with_root(root: Directory) -> Self {
        Self {
            root: Mutex::new(root),
        }
    }

    /// Copy of the stored document.
    pub fn snapshot(&self) -> Directory {
        self.root.lock().clone()
    }
}

#[async_trait]
impl Provider for MemoryProvider {
    async fn fetch_all(&self) -> Result<Vec<Node>> {
        Ok(self.root.lock().children.values().cloned().collect())
    }

    async fn insert(&self, parent: &[NodeName], node: Node) -> Result<Inserted> {
        self.root.lock().insert(parent, node.clone())?;
        Ok(Inserted {
            parent: parent.to_vec(),
            node,
        })
    }

    async fn rename(&self, path: &[NodeName], new_name: &str) -> Result<Renamed> {
        self.root.lock().rename(path, new_name)?;
        Ok(Renamed {
            old_path: path.to_vec(),
            new_name: new_name.to_string(),
        })
    }

    async fn delete(&self, path: &[NodeName]) -> Result<NodePath> {
        self.root.lock().remove(path)?;
        Ok(path.to_vec())
    }

    async fn move_node(&self, path: &[NodeName], new_parent: &[NodeName]) -> Result<Moved> {
        let new_path = self.root.lock().move_node(path, new_parent)?;
        Ok(Moved {
            old_path: path.to_vec(),
            new_path,
        })
    }

    async fn set_content(&self, path: &[NodeName], content: String) -> Result<()> {
        self.root.lock().set_content(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NoteError;

    fn p(parts: &[&str]) -> NodePath {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn operations_apply_to_stored_tree() {
        let provider = MemoryProvider::new();
        provider.insert(&[], Node::directory("Work")).await.unwrap();
        provider
            .insert(&p(&["Work"]), Node::file("Todo", ""))
            .await
            .unwrap();
        provider
            .set_content(&p(&["Work", "Todo"]), "saved".into())
            .await
            .unwrap();
        let renamed = provider.rename(&p(&["Work"]), "Job").await.unwrap();
        assert_eq!(renamed.new_name, "Job");

        let root = provider.snapshot();
        assert_eq!(root.file_content(&["Job", "Todo"]).unwrap(), "saved");

        let fetched = provider.fetch_all().await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].name(), "Job");
    }

    #[tokio::test]
    async fn errors_pass_through() {
        let provider = MemoryProvider::new();
        let err = provider.delete(&p(&["Nope"])).await.unwrap_err();
        assert!(matches!(err, NoteError::NotFound(_)));
        provider.insert(&[], Node::file("A", "")).await.unwrap();
        let err = provider.insert(&[], Node::file("A", "")).await.unwrap_err();
        assert!(matches!(err, NoteError::Duplicate(_)));
    }

    #[tokio::test]
    async fn move_reports_new_path() {
        let provider = MemoryProvider::new();
        provider.insert(&[], Node::directory("A")).await.unwrap();
        provider.insert(&[], Node::file("B", "")).await.unwrap();
        let moved = provider.move_node(&p(&["B"]), &p(&["A"])).await.unwrap();
        assert_eq!(moved.new_path, p(&["A", "B"]));
    }
}

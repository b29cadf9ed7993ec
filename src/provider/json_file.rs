//! Provider storing the whole document in one JSON file.
//!
//! Every operation reads the file, applies the change to the decoded tree
//! and writes it back. Operations are serialized by an async mutex so
//! concurrent saves never overwrite each other's changes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::{Inserted, Moved, Provider, Renamed};
use crate::error::{NoteError, Result};
use crate::model::path::NodePath;
use crate::model::{Directory, Node, NodeName};

/// Storage format version written to new files.
pub const STORAGE_VERSION: &str = "1";

/// On-disk layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub version: String,
    pub root: Directory,
}

impl Default for StoredDocument {
    fn default() -> Self {
        Self {
            version: STORAGE_VERSION.to_string(),
            root: Directory::root(),
        }
    }
}

/// JSON-file-backed provider.
#[derive(Debug)]
pub struct JsonFileProvider {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the stored document. A missing file is initialised
    /// with an empty root.
    async fn load(&self) -> Result<StoredDocument> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let doc = StoredDocument::default();
                self.store(&doc).await?;
                return Ok(doc);
            }
            Err(e) => return Err(e.into()),
        };
        let doc: StoredDocument = serde_json::from_str(&raw)?;
        if doc.version != STORAGE_VERSION {
            return Err(NoteError::Provider(format!(
                "unsupported storage version {:?} in {}",
                doc.version,
                self.path.display()
            )));
        }
        doc.root.validate()?;
        Ok(doc)
    }

    /// Write the document through a temporary file and rename it into place.
    async fn store(&self, doc: &StoredDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "stored document");
        Ok(())
    }

    /// Apply `change` to the stored tree under the file lock.
    async fn update<T: Send>(
        &self,
        change: impl FnOnce(&mut Directory) -> Result<T> + Send,
    ) -> Result<T> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let outcome = change(&mut doc.root)?;
        self.store(&doc).await?;
        Ok(outcome)
    }
}

#[async_trait]
impl Provider for JsonFileProvider {
    async fn fetch_all(&self) -> Result<Vec<Node>> {
        let _guard = self.lock.lock().await;
        let doc = self.load().await?;
        Ok(doc.root.children.into_values().collect())
    }

    async fn insert(&self, parent: &[NodeName], node: Node) -> Result<Inserted> {
        let stored = node.clone();
        self.update(move |root| root.insert(parent, stored)).await?;
        Ok(Inserted {
            parent: parent.to_vec(),
            node,
        })
    }

    async fn rename(&self, path: &[NodeName], new_name: &str) -> Result<Renamed> {
        self.update(|root| root.rename(path, new_name)).await?;
        Ok(Renamed {
            old_path: path.to_vec(),
            new_name: new_name.to_string(),
        })
    }

    async fn delete(&self, path: &[NodeName]) -> Result<NodePath> {
        self.update(|root| root.remove(path)).await?;
        Ok(path.to_vec())
    }

    async fn move_node(&self, path: &[NodeName], new_parent: &[NodeName]) -> Result<Moved> {
        let new_path = self.update(|root| root.move_node(path, new_parent)).await?;
        Ok(Moved {
            old_path: path.to_vec(),
            new_path,
        })
    }

    async fn set_content(&self, path: &[NodeName], content: String) -> Result<()> {
        self.update(move |root| root.set_content(path, content)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn p(parts: &[&str]) -> NodePath {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn missing_file_is_initialised() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("nested").join("notes.json");
        let provider = JsonFileProvider::new(&file);
        assert!(provider.fetch_all().await.unwrap().is_empty());
        assert!(file.exists());
    }

    #[tokio::test]
    async fn changes_survive_a_new_provider() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.json");
        {
            let provider = JsonFileProvider::new(&file);
            provider.insert(&[], Node::directory("Work")).await.unwrap();
            provider
                .insert(&p(&["Work"]), Node::file("Todo", "draft"))
                .await
                .unwrap();
            provider
                .set_content(&p(&["Work", "Todo"]), "final".into())
                .await
                .unwrap();
            provider.move_node(&p(&["Work", "Todo"]), &[]).await.unwrap();
        }

        let provider = JsonFileProvider::new(&file);
        let nodes = provider.fetch_all().await.unwrap();
        let root = Directory::root_with(nodes).unwrap();
        assert_eq!(root.file_content(&["Todo"]).unwrap(), "final");
        assert!(root.directory(&["Work"]).unwrap().children.is_empty());
    }

    #[tokio::test]
    async fn stored_shape_is_versioned() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.json");
        let provider = JsonFileProvider::new(&file);
        provider.insert(&[], Node::file("Note", "x")).await.unwrap();

        let raw = std::fs::read_to_string(&file).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], "1");
        assert_eq!(value["root"]["children"]["Note"]["type"], "file");
        assert_eq!(value["root"]["children"]["Note"]["content"], "x");
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.json");
        std::fs::write(&file, "{ not json").unwrap();
        let provider = JsonFileProvider::new(&file);
        assert!(matches!(
            provider.fetch_all().await,
            Err(NoteError::Json(_))
        ));
    }

    #[tokio::test]
    async fn mismatched_child_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.json");
        std::fs::write(
            &file,
            r#"{"version":"1","root":{"name":"/","children":{"A":{"type":"file","name":"B","content":""}}}}"#,
        )
        .unwrap();
        let provider = JsonFileProvider::new(&file);
        assert!(matches!(
            provider.fetch_all().await,
            Err(NoteError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn failed_change_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.json");
        let provider = JsonFileProvider::new(&file);
        provider.insert(&[], Node::file("A", "")).await.unwrap();
        let before = std::fs::read_to_string(&file).unwrap();
        assert!(matches!(
            provider.insert(&[], Node::directory("A")).await,
            Err(NoteError::Duplicate(_))
        ));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), before);
    }

    #[tokio::test]
    async fn concurrent_saves_do_not_lose_updates() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.json");
        let provider = JsonFileProvider::new(&file);
        for name in ["a", "b", "c", "d"] {
            provider.insert(&[], Node::file(name, "")).await.unwrap();
        }

        let paths: Vec<NodePath> = ["a", "b", "c", "d"].iter().map(|n| p(&[*n])).collect();
        let saves = paths
            .iter()
            .map(|path| provider.set_content(path, format!("{}!", path[0])));
        for result in futures::future::join_all(saves).await {
            result.unwrap();
        }

        let root = Directory::root_with(provider.fetch_all().await.unwrap()).unwrap();
        for name in ["a", "b", "c", "d"] {
            assert_eq!(root.file_content(&[name]).unwrap(), format!("{name}!"));
        }
    }
}

//! Async orchestration of a [`Workspace`] over a storage [`Provider`].
//!
//! The workspace lock is only held for synchronous transitions, never across
//! a provider call, so the document stays readable and editable while saves
//! are in flight.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::shadow::ShadowKind;
use super::workspace::Workspace;
use crate::error::{NoteError, Result};
use crate::event::{Notice, Operation};
use crate::model::path::{self, NodePath};
use crate::model::{collision_free_name, validate_name, Node};
use crate::provider::Provider;

/// Default highlight duration for [`Session::flash`].
pub const DEFAULT_FLASH: Duration = Duration::from_millis(1000);

/// Outcome of [`Session::save_many`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: Vec<NodePath>,
    /// Failed paths with the rendered error.
    pub failed: Vec<(NodePath, String)>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Session {
    workspace: Mutex<Workspace>,
    provider: Arc<dyn Provider>,
    notices: Option<UnboundedSender<Notice>>,
    flash_duration: Duration,
}

impl Session {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            workspace: Mutex::new(Workspace::new()),
            provider,
            notices: None,
            flash_duration: DEFAULT_FLASH,
        }
    }

    /// Send notices to `tx`.
    pub fn with_notices(mut self, tx: UnboundedSender<Notice>) -> Self {
        self.notices = Some(tx);
        self
    }

    pub fn with_flash_duration(mut self, duration: Duration) -> Self {
        self.flash_duration = duration;
        self
    }

    /// Copy of the current state, for one render pass.
    pub fn snapshot(&self) -> Workspace {
        self.workspace.lock().clone()
    }

    /// Read the current state without copying it.
    pub fn view<R>(&self, f: impl FnOnce(&Workspace) -> R) -> R {
        f(&self.workspace.lock())
    }

    fn notify(&self, notice: Notice) {
        if let Some(tx) = &self.notices {
            // A closed receiver only means nobody is listening anymore.
            let _ = tx.send(notice);
        }
    }

    fn operation_failed(&self, operation: Operation, path: &[String], error: NoteError) -> NoteError {
        warn!(
            operation = operation.as_str(),
            path = %path::display(path),
            error = %error,
            "operation failed"
        );
        self.notify(Notice::OperationFailed {
            operation,
            path: path.to_vec(),
            message: error.to_string(),
        });
        error
    }

    // ── Fetch ───────────────────────────────────────────────────────────────

    /// Replace the document with the provider's copy. Unsaved flags are
    /// reset; on failure the previous document is kept.
    pub async fn fetch(&self) -> Result<()> {
        self.workspace.lock().fetch_started();
        let fetched = self.provider.fetch_all().await;
        let outcome = fetched.and_then(|nodes| {
            let count = nodes.len();
            self.workspace.lock().replace_root(nodes).map(|_| count)
        });
        match outcome {
            Ok(count) => {
                info!(count, "fetched document");
                self.notify(Notice::Fetched { count });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "fetch failed");
                self.workspace.lock().fetch_failed(e.to_string());
                self.notify(Notice::FetchFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    // ── Structural mutations ────────────────────────────────────────────────

    /// Insert `node` under `parent`. The provider confirms first; its
    /// version of the node is what lands in the document.
    pub async fn insert<S: AsRef<str>>(&self, parent: &[S], node: Node) -> Result<NodePath> {
        let parent = path::to_owned(parent);
        validate_name(node.name())?;
        let confirmed = match self.provider.insert(&parent, node).await {
            Ok(confirmed) => confirmed,
            Err(e) => return Err(self.operation_failed(Operation::Insert, &parent, e)),
        };
        let inserted = self.workspace.lock().insert(&confirmed.parent, confirmed.node);
        inserted.map_err(|e| self.operation_failed(Operation::Insert, &confirmed.parent, e))
    }

    /// Insert `node` under `parent`, renaming it to the first free
    /// "Name", "Name 2", "Name 3", ... among the current children.
    pub async fn insert_unique<S: AsRef<str>>(&self, parent: &[S], mut node: Node) -> Result<NodePath> {
        let free = {
            let ws = self.workspace.lock();
            let dir = ws.root().directory(parent)?;
            collision_free_name(node.name(), dir.children.keys())
        };
        node.set_name(free);
        self.insert(parent, node).await
    }

    pub async fn rename<S: AsRef<str>>(&self, node_path: &[S], new_name: &str) -> Result<NodePath> {
        let node_path = path::to_owned(node_path);
        validate_name(new_name)?;
        if node_path.is_empty() {
            return Err(NoteError::InvalidPath("cannot rename the root".into()));
        }
        let confirmed = match self.provider.rename(&node_path, new_name).await {
            Ok(confirmed) => confirmed,
            Err(e) => return Err(self.operation_failed(Operation::Rename, &node_path, e)),
        };
        let renamed = self
            .workspace
            .lock()
            .rename(&confirmed.old_path, &confirmed.new_name);
        renamed.map_err(|e| self.operation_failed(Operation::Rename, &confirmed.old_path, e))
    }

    pub async fn delete<S: AsRef<str>>(&self, node_path: &[S]) -> Result<()> {
        let node_path = path::to_owned(node_path);
        if node_path.is_empty() {
            return Err(NoteError::InvalidPath("cannot delete the root".into()));
        }
        let confirmed = match self.provider.delete(&node_path).await {
            Ok(confirmed) => confirmed,
            Err(e) => return Err(self.operation_failed(Operation::Delete, &node_path, e)),
        };
        let deleted = self.workspace.lock().delete(&confirmed);
        deleted.map_err(|e| self.operation_failed(Operation::Delete, &confirmed, e))
    }

    pub async fn move_node<A: AsRef<str>, B: AsRef<str>>(
        &self,
        node_path: &[A],
        new_parent: &[B],
    ) -> Result<NodePath> {
        let node_path = path::to_owned(node_path);
        let new_parent = path::to_owned(new_parent);
        let confirmed = match self.provider.move_node(&node_path, &new_parent).await {
            Ok(confirmed) => confirmed,
            Err(e) => return Err(self.operation_failed(Operation::Move, &node_path, e)),
        };
        let destination = match path::split_last(&confirmed.new_path) {
            Some((parent, _)) => path::to_owned(parent),
            None => {
                let e = NoteError::InvalidPath("provider moved a node to the root path".into());
                return Err(self.operation_failed(Operation::Move, &node_path, e));
            }
        };
        let moved = self.workspace.lock().move_node(&confirmed.old_path, &destination);
        moved.map_err(|e| self.operation_failed(Operation::Move, &confirmed.old_path, e))
    }

    // ── Content and saving ──────────────────────────────────────────────────

    /// Replace a file's content in memory and mark it unsaved.
    pub fn edit<S: AsRef<str>>(&self, file_path: &[S], content: String) -> Result<()> {
        self.workspace.lock().edit(file_path, content)
    }

    /// Persist the file at `file_path`.
    ///
    /// The unsaved flag is cleared before the provider is called and set
    /// again if the provider fails, at wherever the file lives by then.
    pub async fn save<S: AsRef<str>>(&self, file_path: &[S]) -> Result<()> {
        let file_path = path::to_owned(file_path);
        let pending = self.workspace.lock().begin_save(&file_path)?;
        let outcome = self.provider.set_content(&file_path, pending.content).await;
        let settled = self.workspace.lock().finish_save(pending.ticket, outcome.is_ok());
        if let Some(now) = settled.filter(|now| *now != file_path) {
            debug!(from = %path::display(&file_path), to = %path::display(&now), "file moved during save");
        }
        match outcome {
            Ok(()) => {
                debug!(path = %path::display(&file_path), "saved");
                self.notify(Notice::Saved { path: file_path });
                Ok(())
            }
            Err(e) => {
                warn!(path = %path::display(&file_path), error = %e, "save failed");
                self.notify(Notice::SaveFailed {
                    path: file_path,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Save every unsaved file at or below `start`, all at once.
    ///
    /// Fails only when nothing is unsaved there. Individual failures are
    /// collected in the report and never stop the other saves.
    pub async fn save_many<S: AsRef<str>>(&self, start: &[S]) -> Result<SaveReport> {
        let files = self.workspace.lock().unsaved_files(start)?;
        let outcomes = join_all(files.iter().map(|file| self.save(file))).await;

        let mut report = SaveReport::default();
        for (file, outcome) in files.into_iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.saved.push(file),
                Err(e) => report.failed.push((file, e.to_string())),
            }
        }
        debug!(
            saved = report.saved.len(),
            failed = report.failed.len(),
            "save_many settled"
        );
        Ok(report)
    }

    // ── View state ──────────────────────────────────────────────────────────

    pub fn open<S: AsRef<str>>(&self, node_path: &[S]) -> Result<()> {
        self.workspace.lock().open(node_path)
    }

    pub fn close_current(&self) {
        self.workspace.lock().close_current();
    }

    pub fn is_flag_set<S: AsRef<str>>(&self, kind: ShadowKind, node_path: &[S]) -> bool {
        self.workspace.lock().is_flag_set(kind, node_path)
    }

    pub fn set_editing<S: AsRef<str>>(&self, node_path: &[S], editing: bool) -> Result<()> {
        self.workspace.lock().set_editing(node_path, editing)
    }

    pub fn set_expanded<S: AsRef<str>>(&self, node_path: &[S], expanded: bool) -> Result<()> {
        self.workspace.lock().set_expanded(node_path, expanded)
    }

    pub fn request_focus<S: AsRef<str>>(&self, node_path: &[S]) -> Result<()> {
        self.workspace.lock().request_focus(node_path)
    }

    pub fn take_focus_request<S: AsRef<str>>(&self, node_path: &[S]) -> bool {
        self.workspace.lock().take_focus_request(node_path)
    }

    /// Highlight the node at `node_path` for the configured duration.
    ///
    /// The highlight follows the node if it is renamed or moved meanwhile.
    pub async fn flash<S: AsRef<str>>(&self, node_path: &[S]) -> Result<()> {
        let ticket = self.workspace.lock().begin_highlight(node_path)?;
        tokio::time::sleep(self.flash_duration).await;
        self.workspace.lock().end_highlight(ticket);
        Ok(())
    }
}

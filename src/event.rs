use tokio::sync::mpsc;

use crate::model::path::{self, NodePath};

/// Structural operation named in failure notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Rename,
    Delete,
    Move,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Rename => "rename",
            Operation::Delete => "delete",
            Operation::Move => "move",
        }
    }
}

/// User-facing notifications raised by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A full reload finished.
    Fetched { count: usize },
    /// A full reload failed; the previous document is kept.
    FetchFailed { message: String },
    /// A file's content was persisted.
    Saved { path: NodePath },
    /// A save was rejected; the file is marked unsaved again.
    SaveFailed { path: NodePath, message: String },
    /// A structural change was rejected; nothing was applied.
    OperationFailed {
        operation: Operation,
        path: NodePath,
        message: String,
    },
}

impl Notice {
    /// Whether this notice reports a failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Notice::FetchFailed { .. } | Notice::SaveFailed { .. } | Notice::OperationFailed { .. }
        )
    }

    /// One-line rendering for status bars and terminal output.
    pub fn message(&self) -> String {
        match self {
            Notice::Fetched { count } => format!("Loaded {} top-level node(s)", count),
            Notice::FetchFailed { message } => format!("Failed to load notes: {}", message),
            Notice::Saved { path } => format!("Saved {}", path::display(path)),
            Notice::SaveFailed { path, message } => {
                format!("Failed to save {}: {}", path::display(path), message)
            }
            Notice::OperationFailed {
                operation,
                path,
                message,
            } => format!(
                "Failed to {} {}: {}",
                operation.as_str(),
                path::display(path),
                message
            ),
        }
    }
}

/// Owner of the notice channel. Sessions get a sender; the front end keeps
/// the handler and drains it.
pub struct NoticeHandler {
    rx: mpsc::UnboundedReceiver<Notice>,
    tx: mpsc::UnboundedSender<Notice>,
}

impl Default for NoticeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { rx, tx }
    }

    /// Get a sender clone for a session or background task.
    pub fn sender(&self) -> mpsc::UnboundedSender<Notice> {
        self.tx.clone()
    }

    /// Receive the next notice. The handler holds a sender itself, so this
    /// waits until one arrives.
    pub async fn next(&mut self) -> Option<Notice> {
        self.rx.recv().await
    }

    /// Take every notice queued so far without waiting.
    pub fn drain(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.rx.try_recv() {
            notices.push(notice);
        }
        notices
    }
}

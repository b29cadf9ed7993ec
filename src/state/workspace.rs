//! The central in-memory state: document tree, flag trees, current path.
//!
//! All methods here are synchronous and complete before returning, so a
//! mutation is never observed half-applied. Structural mutations validate
//! against the document first and only then touch the flag trees.

use std::collections::BTreeMap;

use tracing::debug;

use super::shadow::{FlagTree, ShadowKind, ShadowTrees};
use crate::error::{NoteError, Result};
use crate::model::path::{self, NodePath};
use crate::model::{Directory, Node};

/// Fetch and save bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub is_fetching: bool,
    pub fetch_error: Option<String>,
    /// Number of saves dispatched and not yet settled.
    pub pending_saves: usize,
}

/// Handle on a node path that follows renames and moves until released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// A save that has been started but not settled yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub ticket: Ticket,
    /// Content to hand to the provider.
    pub content: String,
}

/// Document root plus the state that shadows it.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: Directory,
    shadows: ShadowTrees,
    current_path: Option<NodePath>,
    status: Status,
    /// Paths of in-flight saves and highlights, kept in step with the document.
    tracked: BTreeMap<Ticket, NodePath>,
    next_ticket: u64,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Create a workspace with an empty root.
    pub fn new() -> Self {
        Self::with_root(Directory::root())
    }

    pub fn with_root(root: Directory) -> Self {
        Self {
            root,
            shadows: ShadowTrees::new(),
            current_path: None,
            status: Status::default(),
            tracked: BTreeMap::new(),
            next_ticket: 0,
        }
    }

    pub fn root(&self) -> &Directory {
        &self.root
    }

    pub fn shadows(&self) -> &ShadowTrees {
        &self.shadows
    }

    pub fn unsaved(&self) -> &FlagTree {
        self.shadows.tree(ShadowKind::Unsaved)
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn current_path(&self) -> Option<&NodePath> {
        self.current_path.as_ref()
    }

    pub fn is_unsaved<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.shadows.is_set(ShadowKind::Unsaved, path)
    }

    /// Whether any file has unsaved changes.
    pub fn has_unsaved_changes(&self) -> bool {
        !self.unsaved().is_empty()
    }

    // ── Fetch ───────────────────────────────────────────────────────────────

    pub fn fetch_started(&mut self) {
        self.status.is_fetching = true;
        self.status.fetch_error = None;
    }

    pub fn fetch_failed(&mut self, message: String) {
        self.status.is_fetching = false;
        self.status.fetch_error = Some(message);
    }

    /// Replace the document with freshly fetched top-level nodes.
    ///
    /// Everything is considered saved afterwards. Other flags are kept; the
    /// current path is dropped if it no longer resolves.
    pub fn replace_root(&mut self, nodes: Vec<Node>) -> Result<()> {
        let root = Directory::root_with(nodes)?;
        self.status.is_fetching = false;
        self.status.fetch_error = None;
        self.root = root;
        self.shadows.reset(ShadowKind::Unsaved);
        if let Some(current) = &self.current_path {
            if !current.is_empty() && self.root.node(current).is_err() {
                self.current_path = None;
            }
        }
        Ok(())
    }

    // ── Structural mutations ────────────────────────────────────────────────

    /// Add `node` under the directory at `parent_path`.
    pub fn insert<S: AsRef<str>>(&mut self, parent_path: &[S], node: Node) -> Result<NodePath> {
        let inserted = self.root.insert(parent_path, node)?;
        debug!(path = %path::display(&inserted), "inserted node");
        Ok(inserted)
    }

    /// Rename the node at `path`; flags and the current path follow.
    pub fn rename<S: AsRef<str>>(&mut self, path: &[S], new_name: &str) -> Result<NodePath> {
        let renamed = self.root.rename(path, new_name)?;
        if !path::eq(path, &renamed) {
            self.shadows.rename(path, new_name);
            self.rebase_paths(path, &renamed);
            debug!(from = %path::display(path), to = %path::display(&renamed), "renamed node");
        }
        Ok(renamed)
    }

    /// Delete the node at `path` and discard every flag below it.
    pub fn delete<S: AsRef<str>>(&mut self, path: &[S]) -> Result<()> {
        self.root.remove(path)?;
        self.shadows.remove(path);
        if matches!(&self.current_path, Some(current) if path::is_prefix(path, current)) {
            self.current_path = None;
        }
        self.tracked.retain(|_, tracked| !path::is_prefix(path, tracked.as_slice()));
        debug!(path = %path::display(path), "deleted node");
        Ok(())
    }

    /// Move the node at `path` into `new_parent_path`; flags and the current
    /// path follow.
    pub fn move_node<A: AsRef<str>, B: AsRef<str>>(
        &mut self,
        path: &[A],
        new_parent_path: &[B],
    ) -> Result<NodePath> {
        let moved = self.root.move_node(path, new_parent_path)?;
        if !path::eq(path, &moved) {
            self.shadows.move_subtree(path, new_parent_path);
            self.rebase_paths(path, &moved);
            debug!(from = %path::display(path), to = %path::display(&moved), "moved node");
        }
        Ok(moved)
    }

    /// Point the current path and every tracked path below `old` at `new`.
    fn rebase_paths<A: AsRef<str>, B: AsRef<str>>(&mut self, old: &[A], new: &[B]) {
        if let Some(current) = &self.current_path {
            if let Some(rebased) = path::rebase(current, old, new) {
                self.current_path = Some(rebased);
            }
        }
        for tracked in self.tracked.values_mut() {
            if let Some(rebased) = path::rebase(tracked.as_slice(), old, new) {
                *tracked = rebased;
            }
        }
    }

    fn track(&mut self, path: NodePath) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.tracked.insert(ticket, path);
        ticket
    }

    /// Where the node behind `ticket` lives now; `None` once it was deleted.
    pub fn tracked_path(&self, ticket: Ticket) -> Option<&NodePath> {
        self.tracked.get(&ticket)
    }

    fn ensure_node<S: AsRef<str>>(&self, path: &[S]) -> Result<()> {
        if !path.is_empty() {
            self.root.node(path)?;
        }
        Ok(())
    }

    // ── Content and saving ──────────────────────────────────────────────────

    /// Replace the content of the file at `path` and mark it unsaved.
    pub fn edit<S: AsRef<str>>(&mut self, path: &[S], content: String) -> Result<()> {
        self.root.set_content(path, content)?;
        self.shadows.set(ShadowKind::Unsaved, path, true);
        Ok(())
    }

    /// Start saving the file at `path`: clear its unsaved flag before the
    /// write is issued and return the content to persist.
    ///
    /// Clearing first means an edit made while the save is in flight marks
    /// the file unsaved again instead of being lost. The returned ticket
    /// follows the file through renames and moves until the save settles.
    pub fn begin_save<S: AsRef<str>>(&mut self, path: &[S]) -> Result<PendingSave> {
        let content = self.root.file_content(path)?.to_string();
        self.shadows.set(ShadowKind::Unsaved, path, false);
        self.status.pending_saves += 1;
        let ticket = self.track(path::to_owned(path));
        Ok(PendingSave { ticket, content })
    }

    /// Settle a save started with [`Workspace::begin_save`] and return where
    /// the file lives now.
    ///
    /// A failed save marks the file unsaved again at its current path. If the
    /// file was deleted meanwhile there is nothing to mark.
    pub fn finish_save(&mut self, ticket: Ticket, succeeded: bool) -> Option<NodePath> {
        self.status.pending_saves = self.status.pending_saves.saturating_sub(1);
        let file_path = self.tracked.remove(&ticket)?;
        if !succeeded && self.root.is_file(&file_path) {
            self.shadows.set(ShadowKind::Unsaved, &file_path, true);
        }
        Some(file_path)
    }

    /// Files with unsaved changes at or below `start`.
    ///
    /// `InvalidPath` when nothing is unsaved there.
    pub fn unsaved_files<S: AsRef<str>>(&self, start: &[S]) -> Result<Vec<NodePath>> {
        let node = self
            .unsaved()
            .node(start)
            .ok_or_else(|| NoteError::InvalidPath(format!("nothing to save at {}", path::display(start))))?;
        if node.value().is_some() {
            return Ok(vec![path::to_owned(start)]);
        }
        if !node.has_children() {
            return Err(NoteError::InvalidPath(format!(
                "nothing to save at {}",
                path::display(start)
            )));
        }
        Ok(node
            .payload_paths()
            .into_iter()
            .map(|relative| {
                let mut full = path::to_owned(start);
                full.extend(relative);
                full
            })
            .collect())
    }

    // ── View state ──────────────────────────────────────────────────────────

    /// Make `path` the currently opened node. The root path is allowed.
    pub fn open<S: AsRef<str>>(&mut self, path: &[S]) -> Result<()> {
        self.ensure_node(path)?;
        self.current_path = Some(path::to_owned(path));
        Ok(())
    }

    pub fn close_current(&mut self) {
        self.current_path = None;
    }

    pub fn is_flag_set<S: AsRef<str>>(&self, kind: ShadowKind, path: &[S]) -> bool {
        self.shadows.is_set(kind, path)
    }

    /// Turn a view flag on or off for `path`.
    ///
    /// Setting a flag requires the node to exist, otherwise a node inserted
    /// later under that name would inherit it. Clearing never fails.
    pub fn set_flag<S: AsRef<str>>(&mut self, kind: ShadowKind, path: &[S], on: bool) -> Result<()> {
        if on {
            self.ensure_node(path)?;
        }
        self.shadows.set(kind, path, on);
        Ok(())
    }

    pub fn set_editing<S: AsRef<str>>(&mut self, path: &[S], editing: bool) -> Result<()> {
        self.set_flag(ShadowKind::Editing, path, editing)
    }

    pub fn set_expanded<S: AsRef<str>>(&mut self, path: &[S], expanded: bool) -> Result<()> {
        self.set_flag(ShadowKind::Expanded, path, expanded)
    }

    pub fn set_highlighted<S: AsRef<str>>(&mut self, path: &[S], highlighted: bool) -> Result<()> {
        self.set_flag(ShadowKind::Highlighted, path, highlighted)
    }

    pub fn request_focus<S: AsRef<str>>(&mut self, path: &[S]) -> Result<()> {
        self.set_flag(ShadowKind::FocusPending, path, true)
    }

    /// Consume a pending focus request for `path`.
    pub fn take_focus_request<S: AsRef<str>>(&mut self, path: &[S]) -> bool {
        let pending = self.shadows.is_set(ShadowKind::FocusPending, path);
        if pending {
            self.shadows.set(ShadowKind::FocusPending, path, false);
        }
        pending
    }

    /// Highlight `path` until [`Workspace::end_highlight`] is called with the
    /// returned ticket.
    pub fn begin_highlight<S: AsRef<str>>(&mut self, path: &[S]) -> Result<Ticket> {
        self.set_highlighted(path, true)?;
        Ok(self.track(path::to_owned(path)))
    }

    /// Drop a highlight wherever its node has been renamed or moved to.
    pub fn end_highlight(&mut self, ticket: Ticket) {
        if let Some(highlighted) = self.tracked.remove(&ticket) {
            self.shadows.set(ShadowKind::Highlighted, &highlighted, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ROOT;

    fn workspace() -> Workspace {
        let mut ws = Workspace::new();
        ws.insert(ROOT, Node::directory("Work")).unwrap();
        ws.insert(&["Work"], Node::file("Todo", "")).unwrap();
        ws.insert(&["Work"], Node::directory("Sub")).unwrap();
        ws.insert(&["Work", "Sub"], Node::file("Deep", "")).unwrap();
        ws.insert(ROOT, Node::directory("Archive")).unwrap();
        ws
    }

    #[test]
    fn edit_marks_unsaved_idempotently() {
        let mut ws = workspace();
        ws.edit(&["Work", "Todo"], "one".into()).unwrap();
        ws.edit(&["Work", "Todo"], "two".into()).unwrap();
        assert!(ws.is_unsaved(&["Work", "Todo"]));
        assert_eq!(ws.root().file_content(&["Work", "Todo"]).unwrap(), "two");
        assert_eq!(ws.unsaved().payload_paths().len(), 1);
    }

    #[test]
    fn edit_rejects_directories_and_missing_paths() {
        let mut ws = workspace();
        assert!(matches!(
            ws.edit(&["Work"], "x".into()),
            Err(NoteError::InvalidPath(_))
        ));
        assert!(matches!(
            ws.edit(&["Work", "Nope"], "x".into()),
            Err(NoteError::NotFound(_))
        ));
        assert!(!ws.has_unsaved_changes());
    }

    #[test]
    fn save_clears_then_restores_on_failure() {
        let mut ws = workspace();
        ws.edit(&["Work", "Todo"], "draft".into()).unwrap();

        let pending = ws.begin_save(&["Work", "Todo"]).unwrap();
        assert_eq!(pending.content, "draft");
        assert!(!ws.is_unsaved(&["Work", "Todo"]));
        assert_eq!(ws.status().pending_saves, 1);

        ws.finish_save(pending.ticket, false);
        assert!(ws.is_unsaved(&["Work", "Todo"]));
        assert_eq!(ws.status().pending_saves, 0);
    }

    #[test]
    fn successful_save_stays_clean() {
        let mut ws = workspace();
        ws.edit(&["Work", "Todo"], "draft".into()).unwrap();
        let pending = ws.begin_save(&["Work", "Todo"]).unwrap();
        ws.finish_save(pending.ticket, true);
        assert!(!ws.has_unsaved_changes());
    }

    #[test]
    fn edit_during_save_is_not_lost() {
        let mut ws = workspace();
        ws.edit(&["Work", "Todo"], "v1".into()).unwrap();
        let pending = ws.begin_save(&["Work", "Todo"]).unwrap();
        ws.edit(&["Work", "Todo"], "v2".into()).unwrap();
        ws.finish_save(pending.ticket, true);
        assert!(ws.is_unsaved(&["Work", "Todo"]));
    }

    #[test]
    fn failed_save_of_deleted_file_does_not_resurrect_flag() {
        let mut ws = workspace();
        ws.edit(&["Work", "Todo"], "v1".into()).unwrap();
        let pending = ws.begin_save(&["Work", "Todo"]).unwrap();
        ws.delete(&["Work", "Todo"]).unwrap();
        assert_eq!(ws.finish_save(pending.ticket, false), None);
        assert!(!ws.has_unsaved_changes());
        assert_eq!(ws.status().pending_saves, 0);
    }

    #[test]
    fn failed_save_follows_rename() {
        let mut ws = workspace();
        ws.edit(&["Work", "Todo"], "v1".into()).unwrap();
        let pending = ws.begin_save(&["Work", "Todo"]).unwrap();
        ws.rename(&["Work", "Todo"], "Done").unwrap();

        let settled = ws.finish_save(pending.ticket, false);
        assert_eq!(settled.as_deref().map(|p| path::display(p)), Some("Work/Done".to_string()));
        assert!(ws.is_unsaved(&["Work", "Done"]));
        assert!(!ws.is_unsaved(&["Work", "Todo"]));
    }

    #[test]
    fn failed_save_follows_move_of_an_ancestor() {
        let mut ws = workspace();
        ws.edit(&["Work", "Sub", "Deep"], "v1".into()).unwrap();
        let pending = ws.begin_save(&["Work", "Sub", "Deep"]).unwrap();
        ws.move_node(&["Work", "Sub"], &["Archive"]).unwrap();
        assert_eq!(
            ws.tracked_path(pending.ticket).map(|p| path::display(p)),
            Some("Archive/Sub/Deep".to_string())
        );

        ws.finish_save(pending.ticket, false);
        assert!(ws.is_unsaved(&["Archive", "Sub", "Deep"]));
        assert!(ws.unsaved().node(&["Work"]).is_none());
        assert!(ws.tracked_path(pending.ticket).is_none());
    }

    #[test]
    fn successful_save_after_move_stays_clean() {
        let mut ws = workspace();
        ws.edit(&["Work", "Todo"], "v1".into()).unwrap();
        let pending = ws.begin_save(&["Work", "Todo"]).unwrap();
        ws.move_node(&["Work", "Todo"], &["Archive"]).unwrap();
        ws.finish_save(pending.ticket, true);
        assert!(!ws.has_unsaved_changes());
    }

    #[test]
    fn rename_carries_unsaved_flags() {
        let mut ws = workspace();
        ws.edit(&["Work", "Sub", "Deep"], "x".into()).unwrap();
        ws.set_expanded(&["Work"], true).unwrap();
        let renamed = ws.rename(&["Work"], "Job").unwrap();
        assert_eq!(renamed, vec!["Job"]);
        assert!(ws.is_unsaved(&["Job", "Sub", "Deep"]));
        assert!(!ws.is_unsaved(&["Work", "Sub", "Deep"]));
        assert!(ws.is_flag_set(ShadowKind::Expanded, &["Job"]));
    }

    #[test]
    fn failed_rename_changes_nothing() {
        let mut ws = workspace();
        ws.edit(&["Work", "Todo"], "x".into()).unwrap();
        let before_root = ws.root().clone();
        let before_shadows = ws.shadows().clone();
        assert!(matches!(
            ws.rename(&["Work"], "Archive"),
            Err(NoteError::Duplicate(_))
        ));
        assert_eq!(ws.root(), &before_root);
        assert_eq!(ws.shadows(), &before_shadows);
    }

    #[test]
    fn delete_discards_flags_below() {
        let mut ws = workspace();
        ws.edit(&["Work", "Sub", "Deep"], "x".into()).unwrap();
        ws.set_editing(&["Work", "Sub"], true).unwrap();
        ws.delete(&["Work"]).unwrap();
        for kind in ShadowKind::ALL {
            assert!(ws.shadows().tree(kind).is_empty(), "{kind:?}");
        }
        assert!(matches!(ws.delete(&["Work"]), Err(NoteError::NotFound(_))));
    }

    #[test]
    fn move_relocates_flags() {
        let mut ws = workspace();
        ws.edit(&["Work", "Sub", "Deep"], "x".into()).unwrap();
        let moved = ws.move_node(&["Work", "Sub"], &["Archive"]).unwrap();
        assert_eq!(moved, vec!["Archive", "Sub"]);
        assert!(ws.is_unsaved(&["Archive", "Sub", "Deep"]));
        assert!(ws.unsaved().node(&["Work"]).is_none());
    }

    #[test]
    fn move_into_same_parent_is_noop() {
        let mut ws = workspace();
        ws.edit(&["Work", "Todo"], "x".into()).unwrap();
        let moved = ws.move_node(&["Work", "Todo"], &["Work"]).unwrap();
        assert_eq!(moved, vec!["Work", "Todo"]);
        assert!(ws.is_unsaved(&["Work", "Todo"]));
    }

    #[test]
    fn current_path_follows_structure() {
        let mut ws = workspace();
        ws.open(&["Work", "Sub", "Deep"]).unwrap();
        ws.rename(&["Work"], "Job").unwrap();
        assert_eq!(
            ws.current_path().map(|p| path::display(p)),
            Some("Job/Sub/Deep".to_string())
        );
        ws.move_node(&["Job", "Sub"], &["Archive"]).unwrap();
        assert_eq!(
            ws.current_path().map(|p| path::display(p)),
            Some("Archive/Sub/Deep".to_string())
        );
        ws.delete(&["Archive"]).unwrap();
        assert!(ws.current_path().is_none());
    }

    #[test]
    fn open_requires_existing_node() {
        let mut ws = workspace();
        assert!(ws.open(&["Nope"]).is_err());
        ws.open(ROOT).unwrap();
        assert_eq!(ws.current_path().map(Vec::len), Some(0));
    }

    #[test]
    fn unsaved_files_under_directory() {
        let mut ws = workspace();
        ws.edit(&["Work", "Todo"], "a".into()).unwrap();
        ws.edit(&["Work", "Sub", "Deep"], "b".into()).unwrap();

        let files = ws.unsaved_files(&["Work"]).unwrap();
        let rendered: Vec<String> = files.iter().map(|p| path::display(p)).collect();
        assert_eq!(rendered, vec!["Work/Sub/Deep", "Work/Todo"]);

        let single = ws.unsaved_files(&["Work", "Todo"]).unwrap();
        assert_eq!(single, vec![vec!["Work".to_string(), "Todo".to_string()]]);

        assert!(matches!(
            ws.unsaved_files(&["Archive"]),
            Err(NoteError::InvalidPath(_))
        ));
    }

    #[test]
    fn replace_root_resets_unsaved_only() {
        let mut ws = workspace();
        ws.edit(&["Work", "Todo"], "a".into()).unwrap();
        ws.set_expanded(&["Work"], true).unwrap();
        ws.open(&["Archive"]).unwrap();
        ws.fetch_started();
        assert!(ws.status().is_fetching);

        ws.replace_root(vec![Node::directory("Work")]).unwrap();
        assert!(!ws.status().is_fetching);
        assert!(!ws.has_unsaved_changes());
        assert!(ws.is_flag_set(ShadowKind::Expanded, &["Work"]));
        assert!(ws.current_path().is_none());
        assert_eq!(ws.root().child_names(), vec!["Work"]);
    }

    #[test]
    fn focus_request_is_consumed() {
        let mut ws = workspace();
        ws.request_focus(&["Work"]).unwrap();
        assert!(ws.take_focus_request(&["Work"]));
        assert!(!ws.take_focus_request(&["Work"]));
    }

    #[test]
    fn flags_need_an_existing_node() {
        let mut ws = workspace();
        assert!(matches!(
            ws.set_expanded(&["Nope"], true),
            Err(NoteError::NotFound(_))
        ));
        assert!(matches!(
            ws.request_focus(&["Work", "Nope"]),
            Err(NoteError::NotFound(_))
        ));
        ws.set_editing(&["Nope"], false).unwrap();
        ws.set_expanded(ROOT, true).unwrap();

        ws.insert(ROOT, Node::directory("Nope")).unwrap();
        for kind in [ShadowKind::Expanded, ShadowKind::Editing, ShadowKind::FocusPending] {
            assert!(!ws.is_flag_set(kind, &["Nope"]), "{kind:?}");
        }
    }

    #[test]
    fn highlight_is_cleared_after_rename() {
        let mut ws = workspace();
        let ticket = ws.begin_highlight(&["Work", "Todo"]).unwrap();
        ws.rename(&["Work"], "Job").unwrap();
        assert!(ws.is_flag_set(ShadowKind::Highlighted, &["Job", "Todo"]));

        ws.end_highlight(ticket);
        assert!(ws.shadows().tree(ShadowKind::Highlighted).is_empty());
        assert!(ws.begin_highlight(&["Work", "Todo"]).is_err());
    }

    #[test]
    fn scenario_insert_edit_save_duplicate() {
        let mut ws = Workspace::new();
        ws.insert(ROOT, Node::file("Note", "")).unwrap();
        assert_eq!(ws.root().child_names(), vec!["Note"]);

        ws.edit(&["Note"], "hello".into()).unwrap();
        assert!(ws.is_unsaved(&["Note"]));

        let pending = ws.begin_save(&["Note"]).unwrap();
        ws.finish_save(pending.ticket, true);
        assert!(!ws.is_unsaved(&["Note"]));

        assert!(matches!(
            ws.insert(ROOT, Node::file("Note", "")),
            Err(NoteError::Duplicate(_))
        ));
        assert_eq!(ws.root().children.len(), 1);
    }
}

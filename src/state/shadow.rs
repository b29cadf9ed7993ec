//! Per-path flag trees kept alongside the document.
//!
//! A flag is set for a path when the flag tree has a payload there; absence
//! means unset. The trees follow every structural change of the document
//! (rename, delete, move) on a best-effort basis: a path missing from a flag
//! tree is simply skipped.

use crate::model::Tree;

/// A tree whose payload marks "flag set" for a path.
pub type FlagTree = Tree<()>;

/// The tracked per-node conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowKind {
    /// Content changed since the last successful save.
    Unsaved,
    /// The node's name is being edited.
    Editing,
    /// The directory is expanded in the navigation tree.
    Expanded,
    /// The node should receive focus on next render.
    FocusPending,
    /// The node is visually highlighted.
    Highlighted,
}

impl ShadowKind {
    pub const ALL: [ShadowKind; 5] = [
        ShadowKind::Unsaved,
        ShadowKind::Editing,
        ShadowKind::Expanded,
        ShadowKind::FocusPending,
        ShadowKind::Highlighted,
    ];
}

/// All flag trees of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowTrees {
    unsaved: FlagTree,
    editing: FlagTree,
    expanded: FlagTree,
    focus_pending: FlagTree,
    highlighted: FlagTree,
}

impl ShadowTrees {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self, kind: ShadowKind) -> &FlagTree {
        match kind {
            ShadowKind::Unsaved => &self.unsaved,
            ShadowKind::Editing => &self.editing,
            ShadowKind::Expanded => &self.expanded,
            ShadowKind::FocusPending => &self.focus_pending,
            ShadowKind::Highlighted => &self.highlighted,
        }
    }

    fn tree_mut(&mut self, kind: ShadowKind) -> &mut FlagTree {
        match kind {
            ShadowKind::Unsaved => &mut self.unsaved,
            ShadowKind::Editing => &mut self.editing,
            ShadowKind::Expanded => &mut self.expanded,
            ShadowKind::FocusPending => &mut self.focus_pending,
            ShadowKind::Highlighted => &mut self.highlighted,
        }
    }

    fn all_mut(&mut self) -> [&mut FlagTree; 5] {
        [
            &mut self.unsaved,
            &mut self.editing,
            &mut self.expanded,
            &mut self.focus_pending,
            &mut self.highlighted,
        ]
    }

    pub fn is_set<S: AsRef<str>>(&self, kind: ShadowKind, path: &[S]) -> bool {
        self.tree(kind).payload(path).is_some()
    }

    /// Set or clear `kind` for `path`. Clearing prunes emptied ancestors but
    /// keeps flags set on descendants.
    pub fn set<S: AsRef<str>>(&mut self, kind: ShadowKind, path: &[S], on: bool) {
        let tree = self.tree_mut(kind);
        if on {
            tree.set_payload(path, ());
        } else {
            tree.clear_payload(path);
        }
    }

    /// Clear every flag of `kind`.
    pub fn reset(&mut self, kind: ShadowKind) {
        *self.tree_mut(kind) = FlagTree::new();
    }

    /// Mirror a rename of the node at `path` in every flag tree.
    pub fn rename<S: AsRef<str>>(&mut self, path: &[S], new_name: &str) {
        for tree in self.all_mut() {
            tree.rename_node(path, new_name);
        }
    }

    /// Drop every flag at or below `path` in every flag tree.
    pub fn remove<S: AsRef<str>>(&mut self, path: &[S]) {
        for tree in self.all_mut() {
            tree.remove_node(path);
        }
    }

    /// Mirror a move of the node at `path` into `new_parent_path`.
    pub fn move_subtree<A: AsRef<str>, B: AsRef<str>>(&mut self, path: &[A], new_parent_path: &[B]) {
        for tree in self.all_mut() {
            tree.move_subtree(path, new_parent_path);
        }
    }
}

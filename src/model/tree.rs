//! Generic labeled tree addressed by name paths.
//!
//! Every node owns a map of named children and an optional payload. The same
//! structure backs per-path flag state (see [`crate::state::shadow`]).
//!
//! Lookups never fail loudly: a missing path reads as "no node" and the
//! structural helpers (`remove_node`, `rename_node`, `move_subtree`) are
//! no-ops on missing paths. Removal prunes ancestors left without payload and
//! without children, so a tree never carries dead interior nodes.

use std::collections::BTreeMap;

use super::path;

/// A tree node with named children and an optional payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree<T> {
    children: BTreeMap<String, Tree<T>>,
    payload: Option<T>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    /// Create an empty tree: no children, no payload.
    pub fn new() -> Self {
        Self {
            children: BTreeMap::new(),
            payload: None,
        }
    }

    /// Create a childless node carrying `payload`.
    pub fn leaf(payload: T) -> Self {
        Self {
            children: BTreeMap::new(),
            payload: Some(payload),
        }
    }

    /// Attach `child` under `name`, returning the modified node.
    pub fn with_child(mut self, name: impl Into<String>, child: Tree<T>) -> Self {
        self.children.insert(name.into(), child);
        self
    }

    /// Payload of this node itself.
    pub fn value(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Direct children of this node.
    pub fn children(&self) -> &BTreeMap<String, Tree<T>> {
        &self.children
    }

    /// Whether this node has at least one child.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Names of all direct children.
    pub fn child_names(&self) -> Vec<&str> {
        self.children.keys().map(String::as_str).collect()
    }

    /// Whether this node has neither children nor a payload.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.payload.is_none()
    }

    /// Find the node at `path`. The root path returns `self`.
    pub fn node<S: AsRef<str>>(&self, path: &[S]) -> Option<&Tree<T>> {
        let mut current = self;
        for part in path {
            current = current.children.get(part.as_ref())?;
        }
        Some(current)
    }

    fn node_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut Tree<T>> {
        let mut current = self;
        for part in path {
            current = current.children.get_mut(part.as_ref())?;
        }
        Some(current)
    }

    /// Walk to `path`, creating empty intermediate nodes on the way.
    fn node_or_insert<S: AsRef<str>>(&mut self, path: &[S]) -> &mut Tree<T> {
        let mut current = self;
        for part in path {
            current = current
                .children
                .entry(part.as_ref().to_string())
                .or_default();
        }
        current
    }

    /// Replace the children and payload of the node at `path` with those of
    /// `node`, creating every missing node along the path.
    pub fn set_node<S: AsRef<str>>(&mut self, path: &[S], node: Tree<T>) {
        let target = self.node_or_insert(path);
        target.children = node.children;
        target.payload = node.payload;
    }

    /// Payload of the node at `path`. A missing node and a node without
    /// payload both read as `None`.
    pub fn payload<S: AsRef<str>>(&self, path: &[S]) -> Option<&T> {
        self.node(path).and_then(Tree::value)
    }

    /// Set the payload of the node at `path`, keeping its children and
    /// creating missing ancestors. Payloads are removed with
    /// [`Tree::clear_payload`].
    pub fn set_payload<S: AsRef<str>>(&mut self, path: &[S], payload: T) {
        self.node_or_insert(path).payload = Some(payload);
    }

    /// Drop the payload at `path`. If the node is left without children it is
    /// removed, pruning empty ancestors. No-op on missing paths.
    pub fn clear_payload<S: AsRef<str>>(&mut self, path: &[S]) {
        let Some(node) = self.node_mut(path) else {
            return;
        };
        node.payload = None;
        if !node.has_children() {
            self.remove_node(path);
        }
    }

    /// Remove the node at `path` together with its subtree.
    ///
    /// Afterwards every ancestor that has neither a payload nor remaining
    /// children is removed as well, stopping at the first ancestor that does
    /// and never removing the root. The root path clears the whole tree.
    /// No-op if the path does not exist.
    pub fn remove_node<S: AsRef<str>>(&mut self, path: &[S]) {
        if path.is_empty() {
            self.children.clear();
            self.payload = None;
            return;
        }
        self.remove_and_prune(path);
    }

    /// Returns true when `self` was emptied by the removal below it and must
    /// be detached by its own parent.
    fn remove_and_prune<S: AsRef<str>>(&mut self, path: &[S]) -> bool {
        let Some((first, rest)) = path.split_first() else {
            return false;
        };
        let name = first.as_ref();
        if rest.is_empty() {
            if self.children.remove(name).is_none() {
                return false;
            }
        } else {
            let Some(child) = self.children.get_mut(name) else {
                return false;
            };
            if !child.remove_and_prune(rest) {
                return false;
            }
            self.children.remove(name);
        }
        self.is_empty()
    }

    /// Rename the last segment of `path` to `new_name`.
    ///
    /// No-op when the name is unchanged or the node does not exist. An
    /// existing sibling called `new_name` is overwritten; callers check for
    /// collisions first.
    pub fn rename_node<S: AsRef<str>>(&mut self, path: &[S], new_name: &str) {
        let Some((parent_path, old_name)) = path::split_last(path) else {
            return;
        };
        if old_name == new_name {
            return;
        }
        let Some(parent) = self.node_mut(parent_path) else {
            return;
        };
        if let Some(node) = parent.children.remove(old_name) {
            parent.children.insert(new_name.to_string(), node);
        }
    }

    /// Detach the subtree at `subtree_path` and reattach it, unchanged, as a
    /// child of `new_parent_path` under its original name.
    ///
    /// Missing destination nodes are created. Ancestors emptied by the detach
    /// are pruned. No-op when the subtree does not exist or when the
    /// destination lies inside the subtree itself. An existing child with the
    /// same name at the destination is overwritten.
    pub fn move_subtree<A: AsRef<str>, B: AsRef<str>>(
        &mut self,
        subtree_path: &[A],
        new_parent_path: &[B],
    ) {
        let Some((old_parent_path, name)) = path::split_last(subtree_path) else {
            return;
        };
        if path::is_prefix(subtree_path, new_parent_path) {
            return;
        }
        let Some(old_parent) = self.node_mut(old_parent_path) else {
            return;
        };
        let Some(subtree) = old_parent.children.remove(name) else {
            return;
        };
        if old_parent.is_empty() {
            self.remove_node(old_parent_path);
        }
        let mut destination = path::to_owned(new_parent_path);
        destination.push(name.to_string());
        self.set_node(&destination, subtree);
    }

    /// Collect the paths of all nodes carrying a payload, depth first. A node
    /// with a payload is reported and its descendants are not visited.
    pub fn payload_paths(&self) -> Vec<path::NodePath> {
        let mut found = Vec::new();
        self.collect_payload_paths(&mut Vec::new(), &mut found);
        found
    }

    fn collect_payload_paths(&self, prefix: &mut path::NodePath, found: &mut Vec<path::NodePath>) {
        if self.payload.is_some() {
            found.push(prefix.clone());
            return;
        }
        for (name, child) in &self.children {
            prefix.push(name.clone());
            child.collect_payload_paths(prefix, found);
            prefix.pop();
        }
    }
}

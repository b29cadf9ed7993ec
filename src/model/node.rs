//! Document nodes: directories and files.
//!
//! The document tree is a [`Directory`] root whose children are [`Node`]s.
//! Names share one namespace per directory regardless of node kind, and a
//! file never owns children. The mutation methods on [`Directory`] are
//! strict: they fail with the specific [`NoteError`] kind and leave the tree
//! untouched on failure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::path::{self, NodeName, NodePath};
use crate::error::{NoteError, Result};

/// Characters that may not appear in a node name.
pub const FORBIDDEN_NAME_CHARS: [char; 8] = ['\\', '/', ':', '*', '"', '<', '>', '|'];

/// Check that `name` is non-empty and free of forbidden characters.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(NoteError::InvalidName("name must not be empty".into()));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(NoteError::InvalidName(format!(
            "{name:?} contains forbidden character {c:?}"
        )));
    }
    Ok(())
}

/// A directory: named children, no content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    pub name: NodeName,
    #[serde(default)]
    pub children: BTreeMap<NodeName, Node>,
}

/// A file: text content, no children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub name: NodeName,
    #[serde(default)]
    pub content: String,
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Directory(Directory),
    File(File),
}

impl Node {
    /// Create an empty directory node.
    pub fn directory(name: impl Into<NodeName>) -> Self {
        Node::Directory(Directory::new(name))
    }

    /// Create a file node with the given content.
    pub fn file(name: impl Into<NodeName>, content: impl Into<String>) -> Self {
        Node::File(File {
            name: name.into(),
            content: content.into(),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Directory(dir) => &dir.name,
            Node::File(file) => &file.name,
        }
    }

    pub fn set_name(&mut self, name: impl Into<NodeName>) {
        match self {
            Node::Directory(dir) => dir.name = name.into(),
            Node::File(file) => file.name = name.into(),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            Node::Directory(dir) => Some(dir),
            Node::File(_) => None,
        }
    }

    pub fn as_directory_mut(&mut self) -> Option<&mut Directory> {
        match self {
            Node::Directory(dir) => Some(dir),
            Node::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Node::File(file) => Some(file),
            Node::Directory(_) => None,
        }
    }
}

impl Directory {
    pub fn new(name: impl Into<NodeName>) -> Self {
        Self {
            name: name.into(),
            children: BTreeMap::new(),
        }
    }

    /// The unnamed root directory.
    pub fn root() -> Self {
        Self::new(path::SEPARATOR.to_string())
    }

    /// Build a root whose children are `nodes`, keyed by their names.
    ///
    /// Fails with `Duplicate` if two nodes share a name.
    pub fn root_with(nodes: Vec<Node>) -> Result<Self> {
        let mut root = Self::root();
        for node in nodes {
            if root.children.contains_key(node.name()) {
                return Err(NoteError::Duplicate(node.name().to_string()));
            }
            root.children.insert(node.name().to_string(), node);
        }
        Ok(root)
    }

    /// Add `node` as a direct child, returning the modified directory.
    pub fn with_child(mut self, node: Node) -> Self {
        self.children.insert(node.name().to_string(), node);
        self
    }

    pub fn child_names(&self) -> Vec<&str> {
        self.children.keys().map(String::as_str).collect()
    }

    /// Children in presentation order: directories first when `dirs_first`,
    /// then by name.
    pub fn sorted_children(&self, dirs_first: bool) -> Vec<&Node> {
        let mut children: Vec<&Node> = self.children.values().collect();
        children.sort_by(|a, b| {
            let mut cmp = std::cmp::Ordering::Equal;
            if dirs_first {
                cmp = b.is_directory().cmp(&a.is_directory());
            }
            cmp.then_with(|| a.name().cmp(b.name()))
        });
        children
    }

    /// Resolve a non-empty path to a node.
    ///
    /// `NotFound` if a segment is missing, `InvalidPath` if the path passes
    /// through a file or is empty.
    pub fn node<S: AsRef<str>>(&self, path: &[S]) -> Result<&Node> {
        let (parent_path, name) = path::split_last(path)
            .ok_or_else(|| NoteError::InvalidPath("the root is not a node".into()))?;
        self.directory(parent_path)
            .map_err(|err| match err {
                NoteError::InvalidPath(_) => invalid_path(path),
                other => other,
            })?
            .children
            .get(name)
            .ok_or_else(|| not_found(path))
    }

    /// Resolve a path to a directory. The root path resolves to `self`.
    ///
    /// `NotFound` if a segment is missing, `InvalidPath` if the path passes
    /// through or ends at a file.
    pub fn directory<S: AsRef<str>>(&self, path: &[S]) -> Result<&Directory> {
        let mut current = self;
        for (depth, part) in path.iter().enumerate() {
            current = match current.children.get(part.as_ref()) {
                Some(Node::Directory(dir)) => dir,
                Some(Node::File(_)) => return Err(invalid_path(&path[..=depth])),
                None => return Err(not_found(&path[..=depth])),
            };
        }
        Ok(current)
    }

    /// Mutable counterpart of [`Directory::directory`].
    pub fn directory_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Result<&mut Directory> {
        let mut current = self;
        for (depth, part) in path.iter().enumerate() {
            current = match current.children.get_mut(part.as_ref()) {
                Some(Node::Directory(dir)) => dir,
                Some(Node::File(_)) => return Err(invalid_path(&path[..=depth])),
                None => return Err(not_found(&path[..=depth])),
            };
        }
        Ok(current)
    }

    /// Content of the file at `path`. `InvalidPath` if it is a directory.
    pub fn file_content<S: AsRef<str>>(&self, path: &[S]) -> Result<&str> {
        match self.node(path)? {
            Node::File(file) => Ok(&file.content),
            Node::Directory(_) => Err(invalid_path(path)),
        }
    }

    /// Whether `path` currently resolves to a file.
    pub fn is_file<S: AsRef<str>>(&self, path: &[S]) -> bool {
        matches!(self.node(path), Ok(Node::File(_)))
    }

    /// Add `node` to the directory at `parent_path` and return its path.
    pub fn insert<S: AsRef<str>>(&mut self, parent_path: &[S], node: Node) -> Result<NodePath> {
        let parent = self.directory_mut(parent_path)?;
        if parent.children.contains_key(node.name()) {
            return Err(NoteError::Duplicate(node.name().to_string()));
        }
        let inserted = path::join(parent_path, node.name());
        parent.children.insert(node.name().to_string(), node);
        Ok(inserted)
    }

    /// Rename the node at `path` and return its new path. Renaming a node to
    /// its current name succeeds without change.
    pub fn rename<S: AsRef<str>>(&mut self, path: &[S], new_name: &str) -> Result<NodePath> {
        let (parent_path, old_name) = path::split_last(path)
            .ok_or_else(|| NoteError::InvalidPath("cannot rename the root".into()))?;
        let parent = self.directory_mut(parent_path)?;
        if !parent.children.contains_key(old_name) {
            return Err(not_found(path));
        }
        let renamed = path::join(parent_path, new_name);
        if old_name == new_name {
            return Ok(renamed);
        }
        if parent.children.contains_key(new_name) {
            return Err(NoteError::Duplicate(new_name.to_string()));
        }
        if let Some(mut node) = parent.children.remove(old_name) {
            node.set_name(new_name);
            parent.children.insert(new_name.to_string(), node);
        }
        Ok(renamed)
    }

    /// Remove the node at `path` (with its whole subtree) and return it.
    pub fn remove<S: AsRef<str>>(&mut self, path: &[S]) -> Result<Node> {
        let (parent_path, name) = path::split_last(path)
            .ok_or_else(|| NoteError::InvalidPath("cannot delete the root".into()))?;
        self.directory_mut(parent_path)?
            .children
            .remove(name)
            .ok_or_else(|| not_found(path))
    }

    /// Move the node at `node_path` into the directory at `new_parent_path`
    /// and return its new path.
    ///
    /// Moving into the current parent succeeds without change. The
    /// destination must be an existing directory outside the moved subtree.
    pub fn move_node<A: AsRef<str>, B: AsRef<str>>(
        &mut self,
        node_path: &[A],
        new_parent_path: &[B],
    ) -> Result<NodePath> {
        let (old_parent_path, name) = path::split_last(node_path)
            .ok_or_else(|| NoteError::InvalidPath("cannot move the root".into()))?;
        self.node(node_path)?;
        if path::eq(old_parent_path, new_parent_path) {
            return Ok(path::to_owned(node_path));
        }
        let destination = self
            .directory(new_parent_path)
            .map_err(|_| not_found(new_parent_path))?;
        if path::is_prefix(node_path, new_parent_path) {
            return Err(NoteError::InvalidPath(format!(
                "cannot move {} into itself",
                path::display(node_path)
            )));
        }
        if destination.children.contains_key(name) {
            return Err(NoteError::Duplicate(name.to_string()));
        }

        let node = self.remove(node_path)?;
        let moved = self.insert(new_parent_path, node)?;
        Ok(moved)
    }

    /// Replace the content of the file at `path`.
    pub fn set_content<S: AsRef<str>>(&mut self, path: &[S], content: String) -> Result<()> {
        let (parent_path, name) = path::split_last(path)
            .ok_or_else(|| NoteError::InvalidPath("the root has no content".into()))?;
        let parent = self.directory_mut(parent_path).map_err(|err| match err {
            NoteError::InvalidPath(_) => invalid_path(path),
            other => other,
        })?;
        match parent.children.get_mut(name) {
            Some(Node::File(file)) => {
                file.content = content;
                Ok(())
            }
            Some(Node::Directory(_)) => Err(invalid_path(path)),
            None => Err(not_found(path)),
        }
    }

    /// Check that every child is stored under its own name.
    pub fn validate(&self) -> Result<()> {
        for (key, child) in &self.children {
            if key != child.name() {
                return Err(NoteError::InvalidPath(format!(
                    "child {key:?} is named {:?}",
                    child.name()
                )));
            }
            if let Node::Directory(dir) = child {
                dir.validate()?;
            }
        }
        Ok(())
    }

    /// Number of nodes below this directory.
    pub fn descendant_count(&self) -> usize {
        self.children
            .values()
            .map(|child| match child {
                Node::Directory(dir) => 1 + dir.descendant_count(),
                Node::File(_) => 1,
            })
            .sum()
    }
}

fn not_found<S: AsRef<str>>(path: &[S]) -> NoteError {
    NoteError::NotFound(path::display(path))
}

fn invalid_path<S: AsRef<str>>(path: &[S]) -> NoteError {
    NoteError::InvalidPath(path::display(path))
}

//! Plain-text rendering of the document tree.

use crate::error::Result;
use crate::model::path::{self, NodePath};
use crate::model::{Directory, Node};
use crate::state::Workspace;

/// One visible row of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatItem {
    pub path: NodePath,
    pub name: String,
    pub depth: usize,
    pub is_dir: bool,
    pub is_last_sibling: bool,
    /// The file, or something below the directory, has unsaved changes.
    pub unsaved: bool,
    /// Box-drawn guide lines and connector shown before the name.
    pub prefix: String,
}

/// Flatten the directory at `start` depth-first in presentation order.
pub fn flatten<S: AsRef<str>>(ws: &Workspace, start: &[S], dirs_first: bool) -> Result<Vec<FlatItem>> {
    let dir = ws.root().directory(start)?;
    let mut items = Vec::new();
    let mut walk = Walk {
        ws,
        dirs_first,
        ancestors_last: Vec::new(),
        items: &mut items,
    };
    walk.push_children(dir, &path::to_owned(start));
    Ok(items)
}

struct Walk<'a> {
    ws: &'a Workspace,
    dirs_first: bool,
    /// For each open ancestor level, whether that ancestor was the last of
    /// its siblings. Its length is the depth of the rows being pushed.
    ancestors_last: Vec<bool>,
    items: &'a mut Vec<FlatItem>,
}

impl Walk<'_> {
    fn push_children(&mut self, dir: &Directory, parent: &[String]) {
        let children = dir.sorted_children(self.dirs_first);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            let is_last = i + 1 == count;
            let child_path = path::join(parent, child.name());
            let item = FlatItem {
                name: child.name().to_string(),
                depth: self.ancestors_last.len() + 1,
                is_dir: child.is_directory(),
                is_last_sibling: is_last,
                unsaved: self.ws.unsaved().node(&child_path).is_some(),
                prefix: self.prefix(is_last),
                path: child_path.clone(),
            };
            self.items.push(item);
            if let Node::Directory(sub) = child {
                self.ancestors_last.push(is_last);
                self.push_children(sub, &child_path);
                self.ancestors_last.pop();
            }
        }
    }

    /// A finished ancestor leaves blank space, an open one a vertical guide.
    fn prefix(&self, is_last: bool) -> String {
        let mut prefix: String = self
            .ancestors_last
            .iter()
            .map(|&last| if last { "   " } else { "│  " })
            .collect();
        prefix.push_str(if is_last { "└──" } else { "├──" });
        prefix
    }
}

/// Render the tree below `start` as lines, one per node.
///
/// Directories are tagged `[D]`, files `[F]`; a `●` marks unsaved changes.
pub fn render_tree<S: AsRef<str>>(ws: &Workspace, start: &[S], dirs_first: bool) -> Result<Vec<String>> {
    let items = flatten(ws, start, dirs_first)?;
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(path::display(start));
    for item in &items {
        let indicator = if item.is_dir { "[D] " } else { "[F] " };
        let marker = if item.unsaved { " ●" } else { "" };
        lines.push(format!("{} {}{}{}", item.prefix, indicator, item.name, marker));
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ROOT;

    fn workspace() -> Workspace {
        let mut ws = Workspace::new();
        ws.insert(ROOT, Node::file("zeta", "")).unwrap();
        ws.insert(ROOT, Node::directory("Work")).unwrap();
        ws.insert(&["Work"], Node::file("Todo", "")).unwrap();
        ws.insert(&["Work"], Node::directory("Sub")).unwrap();
        ws.insert(&["Work", "Sub"], Node::file("Deep", "")).unwrap();
        ws.insert(ROOT, Node::file("alpha", "")).unwrap();
        ws
    }

    #[test]
    fn flatten_orders_dirs_first() {
        let ws = workspace();
        let names: Vec<String> = flatten(&ws, ROOT, true)
            .unwrap()
            .into_iter()
            .map(|item| path::display(&item.path))
            .collect();
        assert_eq!(
            names,
            vec!["Work", "Work/Sub", "Work/Sub/Deep", "Work/Todo", "alpha", "zeta"]
        );
    }

    #[test]
    fn flatten_by_name_only() {
        let ws = workspace();
        let top: Vec<String> = flatten(&ws, ROOT, false)
            .unwrap()
            .into_iter()
            .filter(|item| item.depth == 1)
            .map(|item| item.name)
            .collect();
        assert_eq!(top, vec!["Work", "alpha", "zeta"]);
    }

    #[test]
    fn render_draws_connectors_and_unsaved_marker() {
        let mut ws = workspace();
        ws.edit(&["Work", "Sub", "Deep"], "x".into()).unwrap();
        let lines = render_tree(&ws, ROOT, true).unwrap();
        assert_eq!(
            lines,
            vec![
                "/",
                "├── [D] Work ●",
                "│  ├── [D] Sub ●",
                "│  │  └── [F] Deep ●",
                "│  └── [F] Todo",
                "├── [F] alpha",
                "└── [F] zeta",
            ]
        );
    }

    #[test]
    fn guides_stop_below_a_last_sibling() {
        let mut ws = workspace();
        ws.insert(&["Work", "Sub"], Node::directory("Inner")).unwrap();
        ws.insert(&["Work", "Sub", "Inner"], Node::file("leaf", "")).unwrap();
        ws.insert(ROOT, Node::directory("Last")).unwrap();
        ws.insert(&["Last"], Node::directory("Mid")).unwrap();
        ws.insert(&["Last", "Mid"], Node::file("end", "")).unwrap();
        ws.insert(&["Last"], Node::file("tail", "")).unwrap();

        let items = flatten(&ws, ROOT, true).unwrap();
        let prefixes: Vec<(String, &str)> = items
            .iter()
            .map(|item| (path::display(&item.path), item.prefix.as_str()))
            .collect();
        assert_eq!(
            prefixes,
            vec![
                ("Last".to_string(), "├──"),
                ("Last/Mid".to_string(), "│  ├──"),
                ("Last/Mid/end".to_string(), "│  │  └──"),
                ("Last/tail".to_string(), "│  └──"),
                ("Work".to_string(), "├──"),
                ("Work/Sub".to_string(), "│  ├──"),
                ("Work/Sub/Inner".to_string(), "│  │  ├──"),
                ("Work/Sub/Inner/leaf".to_string(), "│  │  │  └──"),
                ("Work/Sub/Deep".to_string(), "│  │  └──"),
                ("Work/Todo".to_string(), "│  └──"),
                ("alpha".to_string(), "├──"),
                ("zeta".to_string(), "└──"),
            ]
        );
        assert_eq!(items[3].depth, 2);
        assert_eq!(items[7].depth, 4);
    }

    #[test]
    fn last_directory_leaves_blank_guides() {
        let mut ws = Workspace::new();
        ws.insert(ROOT, Node::directory("Only")).unwrap();
        ws.insert(&["Only"], Node::directory("Inner")).unwrap();
        ws.insert(&["Only", "Inner"], Node::file("a", "")).unwrap();
        ws.insert(&["Only", "Inner"], Node::file("b", "")).unwrap();
        let lines = render_tree(&ws, ROOT, true).unwrap();
        assert_eq!(
            lines,
            vec![
                "/",
                "└── [D] Only",
                "   └── [D] Inner",
                "      ├── [F] a",
                "      └── [F] b",
            ]
        );
    }

    #[test]
    fn render_subtree_and_errors() {
        let ws = workspace();
        let lines = render_tree(&ws, &["Work", "Sub"], true).unwrap();
        assert_eq!(lines, vec!["Work/Sub", "└── [F] Deep"]);
        assert!(render_tree(&ws, &["alpha"], true).is_err());
        assert!(render_tree(&ws, &["nope"], true).is_err());
    }
}

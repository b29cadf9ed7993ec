pub mod collision;
pub mod node;
pub mod path;
pub mod tree;

pub use collision::collision_free_name;
pub use node::{validate_name, Directory, File, Node};
pub use path::{NodeName, NodePath, ROOT};
pub use tree::Tree;

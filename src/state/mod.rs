//! Application state: the document workspace, its flag trees, and the
//! session that keeps them in step with a storage provider.

pub mod session;
pub mod shadow;
pub mod workspace;

pub use session::{SaveReport, Session};
pub use shadow::{FlagTree, ShadowKind, ShadowTrees};
pub use workspace::{PendingSave, Status, Ticket, Workspace};

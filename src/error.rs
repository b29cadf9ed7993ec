use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, NoteError>;

/// Errors raised by document operations and storage providers.
#[derive(Debug, Error)]
pub enum NoteError {
    /// A path (or one of its intermediate segments) does not resolve.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A path is structurally wrong for the requested operation.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The operation would create two siblings with the same name.
    #[error("Duplicate name: {0}")]
    Duplicate(String),

    /// A node name is empty or contains a forbidden character.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// The storage medium could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Any other failure reported by a storage provider.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Invalid configuration, such as a bad log directive.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors from file-backed storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors from file-backed storage.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

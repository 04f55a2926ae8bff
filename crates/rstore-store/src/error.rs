use thiserror::Error;

/// Structural conflicts between documents and folders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ContentConflict {
    /// The document path is already occupied by a folder.
    #[error("path is already a folder")]
    PathIsFolder,

    /// A document sits where one of the path's ancestor folders must go.
    #[error("file exists, blocks folder creation")]
    DocumentBlocksFolder,
}

/// Errors from content store operations.
#[derive(Debug, Error)]
pub enum ContentError {
    /// No document exists at the path.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The write would make a path both a document and a folder.
    #[error("conflict at {path}: {reason}")]
    Conflict {
        path: String,
        reason: ContentConflict,
    },

    /// I/O error from the underlying storage medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal state is unusable (e.g. a poisoned lock).
    #[error("content store unavailable: {0}")]
    Unavailable(String),
}

impl ContentError {
    pub(crate) fn conflict(path: &str, reason: ContentConflict) -> Self {
        Self::Conflict {
            path: path.to_string(),
            reason,
        }
    }
}

/// Result alias for content store operations.
pub type ContentResult<T> = Result<T, ContentError>;

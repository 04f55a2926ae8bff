use std::fmt;

use rstore_ledger::LedgerError;
use rstore_path::PathError;
use rstore_store::{ContentConflict, ContentError};
use thiserror::Error;

/// Why a write or delete was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictReason {
    /// A document was written where a folder exists.
    PathIsFolder,
    /// A document sits where a folder of the write path must go.
    DocumentBlocksFolder,
    /// `If-None-Match: *` was given and the document exists.
    AlreadyExists,
    /// `If-Match` tokens did not include the current version.
    VersionMismatch,
}

impl ConflictReason {
    /// The machine-distinguishable reason string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PathIsFolder => "path is already a folder",
            Self::DocumentBlocksFolder => "file exists, blocks folder creation",
            Self::AlreadyExists => "document already exists",
            Self::VersionMismatch => "version mismatch",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ContentConflict> for ConflictReason {
    fn from(conflict: ContentConflict) -> Self {
        match conflict {
            ContentConflict::PathIsFolder => Self::PathIsFolder,
            ContentConflict::DocumentBlocksFolder => Self::DocumentBlocksFolder,
        }
    }
}

/// Which conditional read short-circuited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotModifiedReason {
    Document,
    Folder,
}

impl NotModifiedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document not modified",
            Self::Folder => "folder not modified",
        }
    }
}

impl fmt::Display for NotModifiedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced to the protocol layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Malformed path, or a document operation on a folder path (or the
    /// reverse). Always client-caused.
    #[error(transparent)]
    Path(#[from] PathError),

    /// No document exists where one was required.
    #[error("not found: {0}")]
    NotFound(String),

    /// Structural or version conflict; the caller must resolve and resubmit.
    #[error("conflict at {path}: {reason}")]
    Conflict {
        path: String,
        reason: ConflictReason,
    },

    /// A conditional read matched the current version. Not a failure.
    #[error("{reason}: {path}")]
    NotModified {
        path: String,
        reason: NotModifiedReason,
    },

    /// The content store failed (I/O, unavailable).
    #[error("content store error: {0}")]
    Content(#[source] ContentError),

    /// The ledger failed before anything was mutated.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The ledger failed after the content store was changed; the two
    /// stores now disagree about `path`.
    #[error("ledger update failed after content change at {path}: {source}")]
    Inconsistent {
        path: String,
        #[source]
        source: LedgerError,
    },

    /// Content exists without a version record.
    #[error("no version record for existing path {0}")]
    MissingVersion(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// The reason string for conflicts and not-modified results.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Conflict { reason, .. } => Some(reason.as_str()),
            Self::NotModified { reason, .. } => Some(reason.as_str()),
            _ => None,
        }
    }

    /// `true` for the not-modified short-circuit, which a protocol layer
    /// reports as success.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Self::NotModified { .. })
    }

    pub(crate) fn conflict(path: &str, reason: ConflictReason) -> Self {
        Self::Conflict {
            path: path.to_string(),
            reason,
        }
    }

    pub(crate) fn not_modified(path: &str, reason: NotModifiedReason) -> Self {
        Self::NotModified {
            path: path.to_string(),
            reason,
        }
    }
}

impl From<ContentError> for StorageError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::NotFound(path) => Self::NotFound(path),
            ContentError::Conflict { path, reason } => Self::Conflict {
                path,
                reason: reason.into(),
            },
            other => Self::Content(other),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

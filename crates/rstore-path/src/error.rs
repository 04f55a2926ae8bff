//! Error types for path parsing.

use thiserror::Error;

/// Why a path string was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum InvalidReason {
    #[error("must start with '/'")]
    NotAbsolute,

    #[error("must contain a user segment followed by '/'")]
    MissingUser,

    #[error("must not contain empty segments")]
    EmptySegment,

    #[error("must not contain '.' or '..' segments")]
    DotSegment,

    #[error("must not contain encoded '/'")]
    EncodedSeparator,

    #[error("percent-encoding does not decode to UTF-8")]
    InvalidEncoding,

    #[error("must not contain NUL characters")]
    NulCharacter,

    /// A decoded segment still holds `%`, so its canonical form would
    /// decode differently on the next parse.
    #[error("must not contain '%' after decoding")]
    PercentSign,
}

/// Errors produced when parsing or classifying a [`StoragePath`].
///
/// [`StoragePath`]: crate::StoragePath
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    /// The input is not a valid storage path.
    #[error("invalid path {path:?}: {reason}")]
    Invalid { path: String, reason: InvalidReason },

    /// A document operation was addressed to a folder path.
    #[error("path is not a document: {0}")]
    NotADocument(String),

    /// A folder operation was addressed to a document path.
    #[error("path is not a folder: {0}")]
    NotAFolder(String),
}

impl PathError {
    pub(crate) fn invalid(path: &str, reason: InvalidReason) -> Self {
        Self::Invalid {
            path: path.to_string(),
            reason,
        }
    }

    /// The rejection reason, if this is a parse failure.
    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            Self::Invalid { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Convenience type alias for path operations.
pub type Result<T> = std::result::Result<T, PathError>;

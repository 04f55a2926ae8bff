/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid version string: {0:?}")]
    InvalidVersion(String),

    #[error("version counter overflow for {0}")]
    CounterOverflow(String),

    #[error("corrupt version record for {path}: {reason}")]
    CorruptRecord { path: String, reason: String },

    #[error("value out of range for {path}: {reason}")]
    OutOfRange { path: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid ledger key: {0:?}")]
    InvalidKey(String),

    #[error("integrity violation on key {key}: {reason}")]
    IntegrityViolation { key: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store error: {0}")]
    StoreError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub(crate) fn poisoned(what: &str) -> Self {
        Self::StoreError(format!("{what} lock poisoned"))
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

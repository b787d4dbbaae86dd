use docl_types::{Cid, TypeError};

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// No object exists for the requested CID.
    #[error("blob not found: {0}")]
    NotFound(Cid),

    /// The backend could not be reached or refused the request.
    #[error("{backend} blob store unavailable: {reason}")]
    Unavailable {
        backend: &'static str,
        reason: String,
    },

    /// Stored bytes no longer hash to their CID.
    #[error("corrupt blob {cid}: {reason}")]
    Corrupt { cid: Cid, reason: String },

    /// The backend answered with something that is not a valid response.
    #[error("{backend} protocol error: {reason}")]
    Protocol {
        backend: &'static str,
        reason: String,
    },

    /// A CID handed back by the backend failed validation.
    #[error("invalid CID from backend: {0}")]
    InvalidCid(#[from] TypeError),

    /// I/O error from a local storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlobError {
    pub fn unavailable(backend: &'static str, reason: impl ToString) -> Self {
        Self::Unavailable {
            backend,
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for data-absence failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for blob store operations.
pub type BlobResult<T> = Result<T, BlobError>;

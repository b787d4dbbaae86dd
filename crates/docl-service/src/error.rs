use std::path::PathBuf;

use docl_gate::GateError;
use docl_ledger::LedgerError;
use docl_store::BlobError;
use docl_types::Cid;
use thiserror::Error;

/// Failures of the document operations.
///
/// Every variant carries the offending CID or caller id.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("permission denied for caller '{caller_id}'")]
    PermissionDenied { caller_id: String },

    #[error("blob store unavailable: {reason}")]
    BlobStoreUnavailable { reason: String },

    #[error("ledger write failed for {cid}: {reason}")]
    LedgerWriteFailed { cid: Cid, reason: String },

    #[error("ledger read failed for {cid}: {reason}")]
    LedgerReadFailed { cid: Cid, reason: String },

    #[error("document not found: {0}")]
    DocumentNotFound(Cid),

    #[error("blob not found: {0}")]
    BlobNotFound(Cid),

    #[error("corrupt metadata for {cid}: {reason}")]
    CorruptMetadata { cid: Cid, reason: String },

    #[error("stored blob {cid} is corrupt: {reason}")]
    CorruptBlob { cid: Cid, reason: String },

    #[error("ledger history of {cid} failed verification: {reason}")]
    LedgerIntegrity { cid: Cid, reason: String },
}

impl DocumentError {
    /// A gate refusal always denies the caller, whatever its cause.
    pub(crate) fn from_gate(err: GateError, caller_id: &str) -> Self {
        match err {
            GateError::PermissionDenied { caller_id, .. } => Self::PermissionDenied { caller_id },
            GateError::Config(_) => Self::PermissionDenied {
                caller_id: caller_id.to_string(),
            },
        }
    }

    pub(crate) fn from_blob(err: BlobError) -> Self {
        match err {
            BlobError::NotFound(missing) => Self::BlobNotFound(missing),
            BlobError::Corrupt { cid, reason } => Self::CorruptBlob { cid, reason },
            other => Self::BlobStoreUnavailable {
                reason: other.to_string(),
            },
        }
    }

    pub(crate) fn ledger_read(cid: &Cid, err: LedgerError) -> Self {
        match err {
            LedgerError::IntegrityViolation { reason, .. } => Self::LedgerIntegrity {
                cid: cid.clone(),
                reason,
            },
            other => Self::LedgerReadFailed {
                cid: cid.clone(),
                reason: other.to_string(),
            },
        }
    }

    pub(crate) fn ledger_write(cid: &Cid, err: LedgerError) -> Self {
        Self::LedgerWriteFailed {
            cid: cid.clone(),
            reason: err.to_string(),
        }
    }

    /// Returns `true` for data-absence failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DocumentNotFound(_) | Self::BlobNotFound(_))
    }
}

/// Result alias for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Failures loading configuration or opening configured backends.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("cannot open {backend} backend: {reason}")]
    Backend {
        backend: &'static str,
        reason: String,
    },
}

use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid content identifier {0:?}: {1}")]
    InvalidCid(String, &'static str),

    #[error("invalid transaction id {0:?}")]
    InvalidTxId(String),
}

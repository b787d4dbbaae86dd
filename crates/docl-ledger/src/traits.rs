use docl_crypto::HashChainVerifier;

use crate::error::{LedgerError, LedgerResult};
use crate::history::HistoryIterator;
use crate::records::Revision;

/// Read boundary of the ledger key-value store.
pub trait StateReader: Send + Sync {
    /// Latest value of `key`; `None` if never written or deleted.
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    /// Iterator over every revision of `key`, oldest first.
    ///
    /// A key with no revisions yields an empty iterator.
    fn history_for_key(&self, key: &str) -> LedgerResult<Box<dyn HistoryIterator>>;
}

/// Write boundary of the ledger key-value store.
pub trait StateWriter: Send + Sync {
    /// Commit a new revision of `key` holding `value`.
    fn put_state(&self, key: &str, value: &[u8]) -> LedgerResult<()>;

    /// Commit a tombstone revision of `key`. Prior history is kept.
    fn delete_state(&self, key: &str) -> LedgerResult<()>;
}

/// A full ledger: state access plus the raw, hash-chained revision log.
pub trait Ledger: StateReader + StateWriter {
    /// All stored revisions of `key`, oldest first.
    fn revisions(&self, key: &str) -> LedgerResult<Vec<Revision>>;

    /// Walk `key`'s hash chain and return the number of revisions.
    fn verify_history(&self, key: &str) -> LedgerResult<usize> {
        let revisions = self.revisions(key)?;
        HashChainVerifier::verify_chain(&revisions).map_err(|e| {
            LedgerError::IntegrityViolation {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(revisions.len())
    }
}

pub(crate) fn validate_key(key: &str) -> LedgerResult<()> {
    if key.is_empty() {
        return Err(LedgerError::InvalidKey(key.to_string()));
    }
    Ok(())
}

use std::sync::RwLock;

use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::history::{HistoryIterator, SnapshotHistory};
use crate::records::Revision;
use crate::state::LedgerState;
use crate::traits::{validate_key, Ledger, StateReader, StateWriter};

/// In-memory ledger for tests, local demos, and embedding.
///
/// Writers are serialized behind a `RwLock`; history iterators receive a
/// snapshot of the key's revisions taken when they are opened.
pub struct InMemoryLedger {
    node_id: u16,
    inner: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(node_id: u16) -> Self {
        Self {
            node_id,
            inner: RwLock::new(LedgerState::default()),
        }
    }

    /// Keys with at least one revision, sorted.
    pub fn keys(&self) -> LedgerResult<Vec<String>> {
        Ok(self.read()?.keys())
    }

    /// Total revisions committed across all keys.
    pub fn revision_count(&self) -> LedgerResult<u64> {
        Ok(self.read()?.revision_count())
    }

    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.revision_count()? == 0)
    }

    fn read(&self) -> LedgerResult<std::sync::RwLockReadGuard<'_, LedgerState>> {
        self.inner.read().map_err(|_| LedgerError::poisoned("ledger"))
    }

    fn commit(&self, key: &str, value: Option<Vec<u8>>) -> LedgerResult<()> {
        validate_key(key)?;
        let mut state = self
            .inner
            .write()
            .map_err(|_| LedgerError::poisoned("ledger"))?;
        let revision = state.prepare(key, value, self.node_id);
        debug!(key, tx = %revision.tx_id, delete = revision.is_delete(), "ledger commit");
        state.apply(revision)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(0)
    }
}

impl StateReader for InMemoryLedger {
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.read()?.get(key))
    }

    fn history_for_key(&self, key: &str) -> LedgerResult<Box<dyn HistoryIterator>> {
        validate_key(key)?;
        let snapshot = self.read()?.modifications(key);
        Ok(Box::new(SnapshotHistory::new(snapshot)))
    }
}

impl StateWriter for InMemoryLedger {
    fn put_state(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        self.commit(key, Some(value.to_vec()))
    }

    fn delete_state(&self, key: &str) -> LedgerResult<()> {
        self.commit(key, None)
    }
}

impl Ledger for InMemoryLedger {
    fn revisions(&self, key: &str) -> LedgerResult<Vec<Revision>> {
        validate_key(key)?;
        Ok(self.read()?.revisions(key))
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("node_id", &self.node_id)
            .finish()
    }
}

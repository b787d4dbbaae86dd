use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::history::{HistoryIterator, SnapshotHistory};
use crate::records::Revision;
use crate::state::LedgerState;
use crate::traits::{validate_key, Ledger, StateReader, StateWriter};
use crate::wal::{WalConfig, WriteAheadLog};

/// WAL file name inside a ledger directory.
pub const WAL_FILE: &str = "ledger.wal";

/// Durable ledger backed by a write-ahead log.
///
/// Every committed revision is appended to the WAL before it becomes
/// visible. Opening a ledger replays the WAL to rebuild state.
pub struct FileLedger {
    node_id: u16,
    dir: PathBuf,
    wal: WriteAheadLog,
    inner: RwLock<LedgerState>,
}

impl FileLedger {
    /// Open (or create) the ledger stored in `dir`.
    pub fn open(dir: impl AsRef<Path>, node_id: u16, config: WalConfig) -> LedgerResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let wal = WriteAheadLog::open(&dir.join(WAL_FILE), config)?;

        let mut state = LedgerState::default();
        let recovered = wal.recover()?;
        let replayed = recovered.len();
        for revision in recovered {
            state.apply(revision)?;
        }
        info!(path = %dir.display(), revisions = replayed, "ledger opened");

        Ok(Self {
            node_id,
            dir,
            wal,
            inner: RwLock::new(state),
        })
    }

    pub fn keys(&self) -> LedgerResult<Vec<String>> {
        Ok(self.read()?.keys())
    }

    pub fn revision_count(&self) -> LedgerResult<u64> {
        Ok(self.read()?.revision_count())
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
        self.wal.append(&revision)?;
        debug!(key, tx = %revision.tx_id, delete = revision.is_delete(), "ledger commit");
        state.apply(revision)
    }
}

impl StateReader for FileLedger {
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

impl StateWriter for FileLedger {
    fn put_state(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        self.commit(key, Some(value.to_vec()))
    }

    fn delete_state(&self, key: &str) -> LedgerResult<()> {
        self.commit(key, None)
    }
}

impl Ledger for FileLedger {
    fn revisions(&self, key: &str) -> LedgerResult<Vec<Revision>> {
        validate_key(key)?;
        Ok(self.read()?.revisions(key))
    }
}

impl std::fmt::Debug for FileLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLedger")
            .field("dir", &self.dir)
            .field("node_id", &self.node_id)
            .finish()
    }
}

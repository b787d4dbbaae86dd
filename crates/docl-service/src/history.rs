use std::sync::Arc;

use docl_ledger::{HistoryGuard, Ledger};
use docl_types::{Cid, CommitTimestamp, TxId};
use tracing::debug;

use crate::codec::MetadataRecord;
use crate::error::{DocumentError, DocumentResult};

/// One metadata revision of a document, as committed to the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub tx_id: TxId,
    /// Ledger commit time, distinct from `data.timestamp`.
    pub timestamp: CommitTimestamp,
    pub data: MetadataRecord,
}

/// Replays a document's metadata revisions from the ledger.
pub struct HistoryReconstructor {
    ledger: Arc<dyn Ledger>,
}

impl HistoryReconstructor {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Every live revision of `cid`, oldest first.
    ///
    /// Deleted and empty revisions are skipped. A single undecodable
    /// revision fails the whole call. A key that was never written has an
    /// empty history.
    pub fn get_document_history(&self, cid: &Cid) -> DocumentResult<Vec<HistoryEntry>> {
        let iter = self
            .ledger
            .history_for_key(cid.as_str())
            .map_err(|e| DocumentError::ledger_read(cid, e))?;
        let mut guard = HistoryGuard::new(cid.as_str(), iter);

        let mut entries = Vec::new();
        let mut skipped = 0usize;
        for modification in guard.by_ref() {
            let modification = modification.map_err(|e| DocumentError::ledger_read(cid, e))?;
            let Some(value) = modification.live_value() else {
                skipped += 1;
                continue;
            };
            let data = MetadataRecord::decode(value).map_err(|e| e.for_cid(cid))?;
            entries.push(HistoryEntry {
                tx_id: modification.tx_id,
                timestamp: modification.timestamp,
                data,
            });
        }
        guard
            .close()
            .map_err(|e| DocumentError::ledger_read(cid, e))?;

        debug!(cid = %cid, revisions = entries.len(), skipped, "history reconstructed");
        Ok(entries)
    }

    /// Verify the revision hash chain of `cid`; returns the revision count.
    pub fn verify_document_history(&self, cid: &Cid) -> DocumentResult<usize> {
        let count = self
            .ledger
            .verify_history(cid.as_str())
            .map_err(|e| DocumentError::ledger_read(cid, e))?;
        debug!(cid = %cid, revisions = count, "history verified");
        Ok(count)
    }
}

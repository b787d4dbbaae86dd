use std::collections::BTreeMap;

use docl_crypto::ContentHasher;
use docl_types::{CommitTimestamp, TxId};

use crate::error::{LedgerError, LedgerResult};
use crate::records::{KeyModification, Revision};

/// Revision log shared by the in-process ledgers.
#[derive(Default)]
pub(crate) struct LedgerState {
    revisions: BTreeMap<String, Vec<Revision>>,
    last_commit: Option<CommitTimestamp>,
    tx_seq: u64,
}

impl LedgerState {
    /// Build the next revision of `key` without applying it.
    pub(crate) fn prepare(&self, key: &str, value: Option<Vec<u8>>, node_id: u16) -> Revision {
        let timestamp = CommitTimestamp::next_after(self.last_commit.as_ref(), node_id);
        let prev_hash = self
            .revisions
            .get(key)
            .and_then(|r| r.last())
            .map(|r| r.revision_hash);
        let seq = self.tx_seq + 1;
        let tx_hash = ContentHasher::TX.digest_parts(&[
            key.as_bytes(),
            &seq.to_le_bytes()[..],
            &timestamp.physical_ms.to_le_bytes()[..],
            &timestamp.logical.to_le_bytes()[..],
            &node_id.to_le_bytes()[..],
        ]);
        Revision::seal(key, TxId::from_hash(&tx_hash), timestamp, value, prev_hash)
    }

    /// Append a prepared or replayed revision.
    ///
    /// The revision must link to the current head of its key.
    pub(crate) fn apply(&mut self, revision: Revision) -> LedgerResult<()> {
        let chain = self.revisions.entry(revision.key.clone()).or_default();
        let head = chain.last().map(|r| r.revision_hash);
        if revision.prev_hash != head {
            return Err(LedgerError::IntegrityViolation {
                key: revision.key,
                reason: format!("revision {} does not link to the current head", chain.len()),
            });
        }
        if self.last_commit.map_or(true, |last| revision.timestamp > last) {
            self.last_commit = Some(revision.timestamp);
        }
        self.tx_seq += 1;
        chain.push(revision);
        Ok(())
    }

    pub(crate) fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.revisions
            .get(key)
            .and_then(|r| r.last())
            .and_then(|r| r.value.clone())
    }

    pub(crate) fn modifications(&self, key: &str) -> Vec<KeyModification> {
        self.revisions
            .get(key)
            .map(|r| r.iter().map(Revision::to_modification).collect())
            .unwrap_or_default()
    }

    pub(crate) fn revisions(&self, key: &str) -> Vec<Revision> {
        self.revisions.get(key).cloned().unwrap_or_default()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.revisions.keys().cloned().collect()
    }

    pub(crate) fn revision_count(&self) -> u64 {
        self.tx_seq
    }

    #[cfg(test)]
    pub(crate) fn revisions_mut(&mut self, key: &str) -> Option<&mut Vec<Revision>> {
        self.revisions.get_mut(key)
    }
}

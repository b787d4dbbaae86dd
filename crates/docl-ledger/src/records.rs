use docl_crypto::{ChainedRevision, HashChainVerifier};
use docl_types::{CommitTimestamp, TxId};
use serde::{Deserialize, Serialize};

/// One entry of a key's history as the ledger reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyModification {
    pub tx_id: TxId,
    /// Ledger-assigned commit time.
    pub timestamp: CommitTimestamp,
    /// `None` for deletions.
    pub value: Option<Vec<u8>>,
    pub is_delete: bool,
}

impl KeyModification {
    /// Value bytes if this revision carries a non-empty value.
    pub fn live_value(&self) -> Option<&[u8]> {
        match &self.value {
            Some(v) if !self.is_delete && !v.is_empty() => Some(v),
            _ => None,
        }
    }
}

/// A committed revision of a key, as stored by the in-process ledgers.
///
/// Revisions of one key form a hash chain: `prev_hash` is the previous
/// revision's `revision_hash`, and `revision_hash` covers the key, the
/// transaction id, the commit time and the value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub key: String,
    pub tx_id: TxId,
    pub timestamp: CommitTimestamp,
    pub value: Option<Vec<u8>>,
    pub prev_hash: Option<[u8; 32]>,
    pub revision_hash: [u8; 32],
}

impl Revision {
    /// Build a revision and seal it with its chain hash.
    pub fn seal(
        key: impl Into<String>,
        tx_id: TxId,
        timestamp: CommitTimestamp,
        value: Option<Vec<u8>>,
        prev_hash: Option<[u8; 32]>,
    ) -> Self {
        let mut revision = Self {
            key: key.into(),
            tx_id,
            timestamp,
            value,
            prev_hash,
            revision_hash: [0; 32],
        };
        revision.revision_hash =
            HashChainVerifier::compute_hash(&revision.payload_bytes(), prev_hash);
        revision
    }

    pub fn is_delete(&self) -> bool {
        self.value.is_none()
    }

    pub fn to_modification(&self) -> KeyModification {
        KeyModification {
            tx_id: self.tx_id.clone(),
            timestamp: self.timestamp,
            value: self.value.clone(),
            is_delete: self.is_delete(),
        }
    }
}

impl ChainedRevision for Revision {
    fn revision_hash(&self) -> [u8; 32] {
        self.revision_hash
    }

    fn prev_hash(&self) -> Option<[u8; 32]> {
        self.prev_hash
    }

    fn payload_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64 + self.value.as_ref().map_or(0, Vec::len));
        put_field(&mut buf, self.key.as_bytes());
        put_field(&mut buf, self.tx_id.as_str().as_bytes());
        buf.extend_from_slice(&self.timestamp.physical_ms.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.logical.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.node_id.to_le_bytes());
        match &self.value {
            Some(value) => {
                buf.push(1);
                put_field(&mut buf, value);
            }
            None => buf.push(0),
        }
        buf
    }
}

fn put_field(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    buf.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(n: u8) -> TxId {
        TxId::from_hash(&[n; 32])
    }

    #[test]
    fn seal_produces_verifiable_chain() {
        let first = Revision::seal("k", tx(1), CommitTimestamp::new(1, 0, 0), Some(b"a".to_vec()), None);
        let second = Revision::seal(
            "k",
            tx(2),
            CommitTimestamp::new(2, 0, 0),
            Some(b"b".to_vec()),
            Some(first.revision_hash),
        );
        assert!(HashChainVerifier::verify_chain(&[first, second]).is_ok());
    }

    #[test]
    fn tombstone_differs_from_empty_value() {
        let ts = CommitTimestamp::new(5, 0, 0);
        let tombstone = Revision::seal("k", tx(1), ts, None, None);
        let empty = Revision::seal("k", tx(1), ts, Some(Vec::new()), None);
        assert_ne!(tombstone.revision_hash, empty.revision_hash);
        assert!(tombstone.is_delete());
        assert!(!empty.is_delete());
    }

    #[test]
    fn live_value_skips_empty_and_deleted() {
        let ts = CommitTimestamp::new(5, 0, 0);
        let live = Revision::seal("k", tx(1), ts, Some(b"v".to_vec()), None).to_modification();
        let empty = Revision::seal("k", tx(2), ts, Some(Vec::new()), None).to_modification();
        let deleted = Revision::seal("k", tx(3), ts, None, None).to_modification();
        assert_eq!(live.live_value(), Some(&b"v"[..]));
        assert_eq!(empty.live_value(), None);
        assert!(deleted.is_delete);
        assert_eq!(deleted.live_value(), None);
    }

    #[test]
    fn bincode_round_trip() {
        let revision = Revision::seal("k", tx(9), CommitTimestamp::new(7, 1, 2), Some(b"x".to_vec()), None);
        let bytes = bincode::serialize(&revision).unwrap();
        let back: Revision = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, revision);
    }
}

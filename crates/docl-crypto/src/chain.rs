use crate::hasher::ContentHasher;

/// A revision that participates in a per-key hash chain.
pub trait ChainedRevision {
    /// The revision's own hash.
    fn revision_hash(&self) -> [u8; 32];
    /// The previous revision's hash (None for the first revision of a key).
    fn prev_hash(&self) -> Option<[u8; 32]>;
    /// Canonical payload bytes covered by the hash.
    fn payload_bytes(&self) -> Vec<u8>;
}

/// Hash chain integrity verifier.
///
/// A key's revisions form a valid chain when each revision's `prev_hash`
/// matches the previous revision's hash and every hash is correctly computed
/// from its payload. Rewriting any historical revision breaks the chain.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a chain of revisions, oldest first.
    pub fn verify_chain(revisions: &[impl ChainedRevision]) -> Result<(), ChainError> {
        let mut expected_prev: Option<[u8; 32]> = None;

        for (index, revision) in revisions.iter().enumerate() {
            match (expected_prev, revision.prev_hash()) {
                (None, Some(_)) => return Err(ChainError::GenesisHasPrevHash),
                (Some(_), None) => return Err(ChainError::MissingPrevHash { index }),
                (Some(expected), Some(prev)) if expected != prev => {
                    return Err(ChainError::BrokenLink { index })
                }
                _ => {}
            }

            let computed = Self::compute_hash(&revision.payload_bytes(), expected_prev);
            if computed != revision.revision_hash() {
                return Err(ChainError::HashMismatch { index });
            }
            expected_prev = Some(computed);
        }

        Ok(())
    }

    /// Compute the expected hash for a payload and optional previous hash.
    pub fn compute_hash(payload: &[u8], prev_hash: Option<[u8; 32]>) -> [u8; 32] {
        match prev_hash {
            Some(prev) => ContentHasher::REVISION.digest_parts(&[&b"link"[..], &prev[..], payload]),
            None => ContentHasher::REVISION.digest_parts(&[&b"genesis"[..], payload]),
        }
    }
}

/// Errors from chain verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("first revision has a previous hash (should be None)")]
    GenesisHasPrevHash,

    #[error("broken link at index {index}: prev_hash does not match")]
    BrokenLink { index: usize },

    #[error("missing prev_hash at index {index} (should reference previous revision)")]
    MissingPrevHash { index: usize },

    #[error("hash mismatch at index {index}: computed hash differs from stored")]
    HashMismatch { index: usize },
}

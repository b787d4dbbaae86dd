use docl_types::Cid;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"docl-blob-v1"`) that is prepended
/// to every hash computation, so a blob and a ledger revision with identical
/// bytes never share a hash.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for document blobs; the digest becomes the native [`Cid`].
    pub const BLOB: Self = Self {
        domain: "docl-blob-v1",
    };
    /// Hasher for ledger revisions (hash chain links).
    pub const REVISION: Self = Self {
        domain: "docl-revision-v1",
    };
    /// Hasher for transaction ids minted by in-process ledgers.
    pub const TX: Self = Self {
        domain: "docl-tx-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn digest(&self, data: &[u8]) -> [u8; 32] {
        self.digest_parts(&[data])
    }

    /// Hash several byte slices as one domain-separated message.
    ///
    /// Each part is length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
    pub fn digest_parts(&self, parts: &[&[u8]]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        *hasher.finalize().as_bytes()
    }

    /// Incremental form of [`Self::digest`] for content of a known length.
    ///
    /// Feeding exactly `total_len` bytes and finalizing yields the same
    /// digest as hashing the whole buffer at once.
    pub fn streaming(&self, total_len: u64) -> StreamingDigest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(&total_len.to_le_bytes());
        StreamingDigest { hasher }
    }

    /// Content identifier for `data`.
    pub fn cid(&self, data: &[u8]) -> Cid {
        Cid::from_digest(&self.digest(data))
    }

    /// Verify that `data` hashes to the digest embedded in a native CID.
    ///
    /// Foreign (non-native) CIDs cannot be verified and return `false`.
    pub fn verify(&self, data: &[u8], cid: &Cid) -> bool {
        cid.digest() == Some(self.digest(data))
    }
}

/// Incremental single-part digest, see [`ContentHasher::streaming`].
pub struct StreamingDigest {
    hasher: blake3::Hasher,
}

impl StreamingDigest {
    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
    }

    pub fn finalize(&self) -> [u8; 32] {
        *self.hasher.finalize().as_bytes()
    }
}

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use docl_crypto::ContentHasher;
use docl_types::Cid;
use futures::stream::{self, StreamExt};

use crate::error::{BlobError, BlobResult};
use crate::traits::{BlobStore, ChunkStream};
use crate::DEFAULT_CHUNK_SIZE;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Objects are held behind a `RwLock`;
/// reads hand out cheap `Bytes` slices of the stored buffer, split into
/// `chunk_size` pieces so consumers see a genuinely chunked stream.
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<Cid, Bytes>>,
    chunk_size: usize,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Create a store that streams reads in `chunk_size` pieces.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|b| b.len() as u64)
            .sum()
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.objects.read().expect("lock poisoned").contains_key(cid)
    }

    /// Drop an object. Returns `true` if it existed.
    ///
    /// Only for garbage collection and fault simulation; the document
    /// service never deletes blobs.
    pub fn remove(&self, cid: &Cid) -> bool {
        self.objects
            .write()
            .expect("lock poisoned")
            .remove(cid)
            .is_some()
    }

    /// Sorted list of all stored CIDs.
    pub fn all_cids(&self) -> Vec<Cid> {
        let map = self.objects.read().expect("lock poisoned");
        let mut cids: Vec<Cid> = map.keys().cloned().collect();
        cids.sort();
        cids
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn store(&self, content: Bytes) -> BlobResult<Cid> {
        let cid = ContentHasher::BLOB.cid(&content);
        let mut map = self
            .objects
            .write()
            .map_err(|_| BlobError::unavailable("memory", "blob map lock poisoned"))?;
        // Content-addressing guarantees an existing entry holds the same bytes.
        map.entry(cid.clone()).or_insert(content);
        Ok(cid)
    }

    async fn retrieve(&self, cid: &Cid) -> BlobResult<ChunkStream> {
        let content = self
            .objects
            .read()
            .map_err(|_| BlobError::unavailable("memory", "blob map lock poisoned"))?
            .get(cid)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(cid.clone()))?;

        let chunk_size = self.chunk_size;
        let chunks: Vec<BlobResult<Bytes>> = (0..content.len())
            .step_by(chunk_size)
            .map(|start| Ok(content.slice(start..(start + chunk_size).min(content.len()))))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("object_count", &self.len())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

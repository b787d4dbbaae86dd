use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use docl_crypto::{ContentHasher, StreamingDigest};
use docl_types::Cid;
use futures::stream::{self, StreamExt};
use tokio::io::AsyncReadExt;

use crate::error::{BlobError, BlobResult};
use crate::traits::{BlobStore, ChunkStream};
use crate::DEFAULT_CHUNK_SIZE;

/// On-disk content-addressed object directory.
///
/// Objects live at `root/<first two hex chars>/<remaining hex chars>`.
/// Writes go to a temporary file in the shard directory and are renamed into
/// place, so a crash never leaves a partially written object under its CID.
/// Reads re-hash the bytes as they stream and fail with
/// [`BlobError::Corrupt`] if the object no longer matches its CID.
pub struct FsBlobStore {
    root: PathBuf,
    chunk_size: usize,
}

impl FsBlobStore {
    /// Open (creating if needed) an object directory at `root`.
    pub fn open(root: impl Into<PathBuf>) -> BlobResult<Self> {
        Self::with_chunk_size(root, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(root: impl Into<PathBuf>, chunk_size: usize) -> BlobResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            chunk_size: chunk_size.max(1),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the object for `cid`, or `None` for CIDs this store
    /// could never have minted.
    pub fn path_for(&self, cid: &Cid) -> Option<PathBuf> {
        let digest = cid.digest()?;
        let hex = hex::encode(digest);
        Some(self.root.join(&hex[..2]).join(&hex[2..]))
    }

    pub fn contains(&self, cid: &Cid) -> bool {
        self.path_for(cid).is_some_and(|p| p.is_file())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn backend(&self) -> &'static str {
        "fs"
    }

    async fn store(&self, content: Bytes) -> BlobResult<Cid> {
        let cid = ContentHasher::BLOB.cid(&content);
        let path = self
            .path_for(&cid)
            .ok_or_else(|| BlobError::unavailable("fs", "minted CID has no digest"))?;

        if tokio::fs::try_exists(&path).await? {
            tracing::debug!(cid = %cid.short(), "blob already present");
            return Ok(cid);
        }

        let size = content.len();
        tokio::task::spawn_blocking(move || write_atomically(&path, &content))
            .await
            .map_err(|e| BlobError::unavailable("fs", format!("write task failed: {e}")))??;

        tracing::debug!(cid = %cid.short(), size, "blob written");
        Ok(cid)
    }

    async fn retrieve(&self, cid: &Cid) -> BlobResult<ChunkStream> {
        let Some(path) = self.path_for(cid) else {
            return Err(BlobError::NotFound(cid.clone()));
        };

        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlobError::NotFound(cid.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();

        let state = ReadState {
            file,
            digest: ContentHasher::BLOB.streaming(len),
            cid: cid.clone(),
            chunk_size: self.chunk_size,
        };
        Ok(stream::try_unfold(state, read_next_chunk).boxed())
    }
}

struct ReadState {
    file: tokio::fs::File,
    digest: StreamingDigest,
    cid: Cid,
    chunk_size: usize,
}

async fn read_next_chunk(mut state: ReadState) -> BlobResult<Option<(Bytes, ReadState)>> {
    let mut buf = BytesMut::zeroed(state.chunk_size);
    let n = state.file.read(&mut buf).await?;
    if n == 0 {
        if state.cid.digest() != Some(state.digest.finalize()) {
            tracing::warn!(cid = %state.cid, "blob failed verification on read");
            return Err(BlobError::Corrupt {
                cid: state.cid,
                reason: "content does not hash to its CID".into(),
            });
        }
        return Ok(None);
    }
    buf.truncate(n);
    state.digest.update(&buf);
    Ok(Some((buf.freeze(), state)))
}

fn write_atomically(path: &Path, content: &[u8]) -> BlobResult<()> {
    let shard = path
        .parent()
        .ok_or_else(|| BlobError::unavailable("fs", "object path has no shard directory"))?;
    std::fs::create_dir_all(shard)?;

    let mut tmp = tempfile::NamedTempFile::new_in(shard)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| BlobError::Io(e.error))?;
    Ok(())
}

impl std::fmt::Debug for FsBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBlobStore")
            .field("root", &self.root)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::collect_chunks;
    use futures::TryStreamExt;

    fn temp_store(chunk_size: usize) -> (tempfile::TempDir, FsBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::with_chunk_size(dir.path().join("blobs"), chunk_size).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn store_and_retrieve() {
        let (_dir, store) = temp_store(DEFAULT_CHUNK_SIZE);
        let cid = store.store(Bytes::from_static(b"on disk")).await.unwrap();
        assert!(store.contains(&cid));
        let content = collect_chunks(store.retrieve(&cid).await.unwrap()).await.unwrap();
        assert_eq!(&content[..], b"on disk");
    }

    #[tokio::test]
    async fn objects_are_sharded() {
        let (_dir, store) = temp_store(DEFAULT_CHUNK_SIZE);
        let cid = store.store(Bytes::from_static(b"sharded")).await.unwrap();
        let path = store.path_for(&cid).unwrap();
        let shard = path.parent().unwrap();
        assert_eq!(shard.parent().unwrap(), store.root());
        assert_eq!(shard.file_name().unwrap().len(), 2);
        assert_eq!(path.file_name().unwrap().len(), 62);
    }

    #[tokio::test]
    async fn store_is_idempotent() {
        let (_dir, store) = temp_store(DEFAULT_CHUNK_SIZE);
        let a = store.store(Bytes::from_static(b"twice")).await.unwrap();
        let b = store.store(Bytes::from_static(b"twice")).await.unwrap();
        assert_eq!(a, b);
        let shard = store.path_for(&a).unwrap().parent().unwrap().to_path_buf();
        assert_eq!(std::fs::read_dir(shard).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn missing_and_foreign_cids_are_not_found() {
        let (_dir, store) = temp_store(DEFAULT_CHUNK_SIZE);
        let absent = ContentHasher::BLOB.cid(b"absent");
        assert!(store.retrieve(&absent).await.err().unwrap().is_not_found());

        let foreign = Cid::parse("QmSomeIpfsHash").unwrap();
        assert!(store.retrieve(&foreign).await.err().unwrap().is_not_found());
    }

    #[tokio::test]
    async fn streams_in_chunks() {
        let (_dir, store) = temp_store(3);
        let cid = store.store(Bytes::from_static(b"abcdefgh")).await.unwrap();
        let chunks: Vec<Bytes> = store.retrieve(&cid).await.unwrap().try_collect().await.unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(&chunks[0][..], b"abc");
        assert_eq!(&chunks[2][..], b"gh");
    }

    #[tokio::test]
    async fn empty_blob_round_trips() {
        let (_dir, store) = temp_store(DEFAULT_CHUNK_SIZE);
        let cid = store.store(Bytes::new()).await.unwrap();
        let content = collect_chunks(store.retrieve(&cid).await.unwrap()).await.unwrap();
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn tampered_object_is_corrupt() {
        let (_dir, store) = temp_store(DEFAULT_CHUNK_SIZE);
        let cid = store.store(Bytes::from_static(b"pristine")).await.unwrap();
        std::fs::write(store.path_for(&cid).unwrap(), b"tampered").unwrap();

        let err = collect_chunks(store.retrieve(&cid).await.unwrap()).await.unwrap_err();
        assert!(matches!(err, BlobError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let cid = {
            let store = FsBlobStore::open(dir.path()).unwrap();
            store.store(Bytes::from_static(b"durable")).await.unwrap()
        };
        let store = FsBlobStore::open(dir.path()).unwrap();
        let content = collect_chunks(store.retrieve(&cid).await.unwrap()).await.unwrap();
        assert_eq!(&content[..], b"durable");
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use docl_types::Cid;
use futures::stream::BoxStream;
use futures::TryStreamExt;

use crate::error::BlobResult;

/// Lazy, finite, forward-only sequence of content chunks.
pub type ChunkStream = BoxStream<'static, BlobResult<Bytes>>;

/// Content-addressed blob store.
///
/// All implementations must satisfy these invariants:
/// - The CID depends only on the content bytes.
/// - `store` is idempotent: storing identical content twice returns the same
///   CID and keeps one object.
/// - `retrieve` fails with [`BlobError::NotFound`](crate::BlobError::NotFound)
///   when no object exists, either when opening or while streaming.
/// - The store never interprets object contents.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend name used in logs and errors.
    fn backend(&self) -> &'static str;

    /// Store `content` and return its content identifier.
    async fn store(&self, content: Bytes) -> BlobResult<Cid>;

    /// Open a chunk stream over the object stored under `cid`.
    async fn retrieve(&self, cid: &Cid) -> BlobResult<ChunkStream>;
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    async fn store(&self, content: Bytes) -> BlobResult<Cid> {
        (**self).store(content).await
    }

    async fn retrieve(&self, cid: &Cid) -> BlobResult<ChunkStream> {
        (**self).retrieve(cid).await
    }
}

/// Drain a chunk stream into one contiguous buffer.
///
/// Any chunk error aborts the read; no partial content is returned.
pub async fn collect_chunks(mut chunks: ChunkStream) -> BlobResult<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = chunks.try_next().await? {
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

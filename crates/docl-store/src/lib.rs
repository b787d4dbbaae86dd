//! Content-addressed blob storage for DocLedger.
//!
//! Document bytes live outside the ledger in a content-addressed store. The
//! ledger only ever records the [`Cid`](docl_types::Cid) handed back by
//! [`BlobStore::store`]; reads stream the bytes back with
//! [`BlobStore::retrieve`].
//!
//! # Backends
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- sharded on-disk object directory with on-read verification
//! - [`IpfsBlobStore`] -- IPFS (Kubo) HTTP API client
//!
//! # Rules
//!
//! 1. Identical content yields the same CID; storing twice is a no-op.
//! 2. A retrieve stream is a single forward pass; re-reading needs a new call.
//! 3. All backend errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod ipfs;
pub mod memory;
pub mod traits;

pub use error::{BlobError, BlobResult};
pub use fs::FsBlobStore;
pub use ipfs::{IpfsBlobStore, IpfsConfig};
pub use memory::InMemoryBlobStore;
pub use traits::{collect_chunks, BlobStore, ChunkStream};

/// Default chunk size for streamed reads.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

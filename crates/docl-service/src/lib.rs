//! Document service for DocLedger.
//!
//! Links an append-only ledger to a content-addressed blob store. Uploads
//! store the bytes first and then record a metadata record keyed by the
//! content identifier; views join the two back together; history replays
//! every metadata revision of a document in commit order.
//!
//! The [`DocumentContract`] is the operation surface exposed to a host:
//! `upload_document`, `view_document`, `get_document_history`, and
//! `verify_document_history`.

pub mod codec;
pub mod config;
pub mod contract;
pub mod document;
pub mod error;
pub mod history;

#[cfg(test)]
pub(crate) mod testing;

pub use codec::{CodecError, MetadataRecord};
pub use config::{BlobBackend, BlobConfig, LedgerConfig, ServiceConfig};
pub use contract::DocumentContract;
pub use document::{DocumentService, DocumentView};
pub use error::{ConfigError, DocumentError, DocumentResult};
pub use history::{HistoryEntry, HistoryReconstructor};

pub use docl_gate::{Identity, IdentityContext, StaticIdentity};
pub use docl_types::{Cid, CommitTimestamp, TxId};

//! Foundation types for DocLedger.
//!
//! Every other DocLedger crate depends on `docl-types`.
//!
//! # Key Types
//!
//! - [`Cid`]: Content identifier of a stored blob; primary key of a ledger entry
//! - [`TxId`]: Identifier of the ledger transaction that committed a revision
//! - [`CommitTimestamp`]: Hybrid Logical Clock commit time assigned by the ledger

pub mod cid;
pub mod error;
pub mod temporal;
pub mod tx;

pub use cid::Cid;
pub use error::TypeError;
pub use temporal::CommitTimestamp;
pub use tx::TxId;

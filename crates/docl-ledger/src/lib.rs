//! Ledger key-value boundary for DocLedger.
//!
//! The ledger is treated as a black box with three primitives: read the
//! latest value of a key, write a new value, and iterate every revision of a
//! key in commit order. This crate provides:
//! - `StateReader` / `StateWriter` / `Ledger` trait boundaries
//! - `HistoryIterator` with explicit `close()` and the scoped `HistoryGuard`
//! - `InMemoryLedger` for tests and embedding
//! - `FileLedger`, persisted through a CRC-framed write-ahead log
//! - Per-key revision hash chains for tamper evidence

pub mod error;
pub mod file;
pub mod history;
pub mod memory;
pub mod records;
mod state;
pub mod traits;
pub mod wal;

pub use error::{LedgerError, LedgerResult};
pub use file::FileLedger;
pub use history::{HistoryGuard, HistoryIterator, SnapshotHistory};
pub use memory::InMemoryLedger;
pub use records::{KeyModification, Revision};
pub use traits::{Ledger, StateReader, StateWriter};
pub use wal::{SyncMode, WalConfig, WriteAheadLog};

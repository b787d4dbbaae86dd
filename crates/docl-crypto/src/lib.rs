//! Hashing primitives for DocLedger.
//!
//! Provides domain-separated BLAKE3 hashing for content identifiers and
//! ledger revisions, and hash chain verification for per-key revision logs.

pub mod chain;
pub mod hasher;

pub use chain::{ChainError, ChainedRevision, HashChainVerifier};
pub use hasher::{ContentHasher, StreamingDigest};

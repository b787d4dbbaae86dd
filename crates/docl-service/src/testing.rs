//! Test doubles shared by the service tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use docl_gate::{AccessGate, GateConfig, StaticIdentity};
use docl_ledger::{
    HistoryIterator, InMemoryLedger, KeyModification, Ledger, LedgerError, LedgerResult,
    Revision, SnapshotHistory, StateReader, StateWriter,
};
use docl_store::{BlobError, BlobResult, BlobStore, ChunkStream, InMemoryBlobStore};
use docl_types::Cid;

use crate::contract::DocumentContract;

pub fn admin() -> StaticIdentity {
    StaticIdentity::new("OrgMSP", "admin-id").with_attribute("hf.Affiliation", "admin")
}

pub fn member() -> StaticIdentity {
    StaticIdentity::new("OrgMSP", "member-id").with_attribute("hf.Affiliation", "member")
}

pub fn anonymous() -> StaticIdentity {
    StaticIdentity::new("OrgMSP", "nobody")
}

/// Blob store wrapper that counts calls and can be switched into failure modes.
#[derive(Default)]
pub struct CountingBlobStore {
    pub inner: InMemoryBlobStore,
    pub stores: AtomicUsize,
    pub retrieves: AtomicUsize,
    pub unavailable: bool,
    pub delay: Option<Duration>,
}

impl CountingBlobStore {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn store_calls(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    pub fn retrieve_calls(&self) -> usize {
        self.retrieves.load(Ordering::SeqCst)
    }

    async fn gate(&self) -> BlobResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable {
            return Err(BlobError::unavailable("test", "connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for CountingBlobStore {
    fn backend(&self) -> &'static str {
        "test"
    }

    async fn store(&self, content: Bytes) -> BlobResult<Cid> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        self.inner.store(content).await
    }

    async fn retrieve(&self, cid: &Cid) -> BlobResult<ChunkStream> {
        self.retrieves.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        self.inner.retrieve(cid).await
    }
}

/// Ledger wrapper that counts calls, can refuse writes, and tracks history
/// iterator closes.
#[derive(Default)]
pub struct CountingLedger {
    pub inner: InMemoryLedger,
    pub puts: AtomicUsize,
    pub fail_writes: bool,
    pub closes: Arc<AtomicUsize>,
    /// Raw history entries appended after the real ones.
    pub injected: Vec<KeyModification>,
}

impl CountingLedger {
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn put_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl StateReader for CountingLedger {
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        self.inner.get_state(key)
    }

    fn history_for_key(&self, key: &str) -> LedgerResult<Box<dyn HistoryIterator>> {
        let mut entries: Vec<KeyModification> = self
            .inner
            .history_for_key(key)?
            .collect::<LedgerResult<_>>()?;
        entries.extend(self.injected.iter().cloned());
        Ok(Box::new(ClosingHistory {
            inner: SnapshotHistory::new(entries),
            closes: self.closes.clone(),
        }))
    }
}

impl StateWriter for CountingLedger {
    fn put_state(&self, key: &str, value: &[u8]) -> LedgerResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(LedgerError::StoreError("endorsement failed".into()));
        }
        self.inner.put_state(key, value)
    }

    fn delete_state(&self, key: &str) -> LedgerResult<()> {
        self.inner.delete_state(key)
    }
}

impl Ledger for CountingLedger {
    fn revisions(&self, key: &str) -> LedgerResult<Vec<Revision>> {
        self.inner.revisions(key)
    }
}

struct ClosingHistory {
    inner: SnapshotHistory,
    closes: Arc<AtomicUsize>,
}

impl Iterator for ClosingHistory {
    type Item = LedgerResult<KeyModification>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl HistoryIterator for ClosingHistory {
    fn close(&mut self) -> LedgerResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close()
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

pub fn contract(blobs: Arc<CountingBlobStore>, ledger: Arc<CountingLedger>) -> DocumentContract {
    DocumentContract::new(AccessGate::new(GateConfig::default()), blobs, ledger)
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use docl_gate::{AccessGate, Action, Identity};
use docl_ledger::Ledger;
use docl_store::{collect_chunks, BlobResult, BlobStore};
use docl_types::Cid;
use tracing::{debug, info, warn};

use crate::codec::MetadataRecord;
use crate::error::{DocumentError, DocumentResult};

/// A document as returned by a view: its metadata and its bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentView {
    pub metadata: MetadataRecord,
    pub content: Bytes,
}

impl DocumentView {
    /// Content as UTF-8 text, if it is valid UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// Orchestrates document uploads and views.
///
/// Upload order is fixed: gate check, blob store, metadata, ledger write.
/// A ledger failure after a successful blob store leaves an unreferenced
/// blob behind; it is logged and not rolled back.
pub struct DocumentService {
    gate: AccessGate,
    blobs: Arc<dyn BlobStore>,
    ledger: Arc<dyn Ledger>,
    blob_timeout: Option<Duration>,
}

impl DocumentService {
    pub fn new(gate: AccessGate, blobs: Arc<dyn BlobStore>, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            gate,
            blobs,
            ledger,
            blob_timeout: None,
        }
    }

    /// Bound every blob store call by `timeout`. `None` waits indefinitely.
    pub fn with_blob_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.blob_timeout = timeout;
        self
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Store `content` and record its metadata. Returns the content's CID.
    pub async fn upload_document(&self, identity: &Identity, content: Bytes) -> DocumentResult<Cid> {
        let principal = self
            .gate
            .authorize(identity, Action::Upload)
            .map_err(|e| DocumentError::from_gate(e, &identity.caller_id))?;

        let size = content.len();
        let cid = self
            .bounded("store", self.blobs.store(content))
            .await?
            .map_err(DocumentError::from_blob)?;
        debug!(cid = %cid, size, backend = self.blobs.backend(), "blob stored");

        let record = MetadataRecord::new(cid.clone(), &principal, Utc::now());
        let value = record.encode().map_err(|e| e.for_cid(&cid))?;

        if let Err(e) = self.ledger.put_state(cid.as_str(), &value) {
            warn!(cid = %cid, error = %e, "ledger write failed; blob left unreferenced");
            return Err(DocumentError::ledger_write(&cid, e));
        }

        info!(
            cid = %cid,
            caller = %principal.caller_id,
            org = %principal.org_id,
            size,
            "document uploaded"
        );
        Ok(cid)
    }

    /// Metadata and full content of the document stored under `cid`.
    pub async fn view_document(&self, cid: &Cid) -> DocumentResult<DocumentView> {
        let value = self
            .ledger
            .get_state(cid.as_str())
            .map_err(|e| DocumentError::ledger_read(cid, e))?;
        let value = match value {
            Some(v) if !v.is_empty() => v,
            _ => return Err(DocumentError::DocumentNotFound(cid.clone())),
        };
        let metadata = MetadataRecord::decode(&value).map_err(|e| e.for_cid(cid))?;

        let blobs = &self.blobs;
        let content = self
            .bounded("retrieve", async move { collect_chunks(blobs.retrieve(cid).await?).await })
            .await?
            .map_err(DocumentError::from_blob)?;

        debug!(cid = %cid, size = content.len(), "document viewed");
        Ok(DocumentView { metadata, content })
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = BlobResult<T>>,
    ) -> DocumentResult<BlobResult<T>> {
        let Some(limit) = self.blob_timeout else {
            return Ok(call.await);
        };
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| DocumentError::BlobStoreUnavailable {
                reason: format!("{} {op} timed out after {limit:?}", self.blobs.backend()),
            })
    }
}

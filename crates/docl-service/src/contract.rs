use std::sync::Arc;

use bytes::Bytes;
use docl_gate::{AccessGate, IdentityContext};
use docl_ledger::{FileLedger, Ledger, WalConfig};
use docl_store::{BlobStore, FsBlobStore, InMemoryBlobStore, IpfsBlobStore, IpfsConfig};
use docl_types::Cid;
use tracing::info;

use crate::config::{BlobBackend, ServiceConfig};
use crate::document::{DocumentService, DocumentView};
use crate::error::{ConfigError, DocumentResult};
use crate::history::{HistoryEntry, HistoryReconstructor};

/// Operation surface exposed to the host runtime.
///
/// Writes take the caller's identity context; reads do not.
pub struct DocumentContract {
    service: DocumentService,
    history: HistoryReconstructor,
}

impl DocumentContract {
    pub fn new(gate: AccessGate, blobs: Arc<dyn BlobStore>, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            history: HistoryReconstructor::new(ledger.clone()),
            service: DocumentService::new(gate, blobs, ledger),
        }
    }

    /// Open the backends described by `config`: a WAL-backed ledger under
    /// `data_dir/ledger` and the configured blob store.
    pub fn open(config: &ServiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let ledger = FileLedger::open(
            config.ledger_dir(),
            0,
            WalConfig {
                sync_mode: config.ledger.sync,
            },
        )
        .map_err(|e| ConfigError::Backend {
            backend: "ledger",
            reason: e.to_string(),
        })?;

        let blobs: Arc<dyn BlobStore> = match config.blob.backend {
            BlobBackend::Fs => Arc::new(
                FsBlobStore::with_chunk_size(config.blob_dir(), config.blob.chunk_size).map_err(
                    |e| ConfigError::Backend {
                        backend: "fs",
                        reason: e.to_string(),
                    },
                )?,
            ),
            BlobBackend::Memory => Arc::new(InMemoryBlobStore::with_chunk_size(config.blob.chunk_size)),
            BlobBackend::Ipfs => Arc::new(
                IpfsBlobStore::new(IpfsConfig {
                    api_url: config.blob.ipfs_api.clone(),
                    ..IpfsConfig::default()
                })
                .map_err(|e| ConfigError::Backend {
                    backend: "ipfs",
                    reason: e.to_string(),
                })?,
            ),
        };

        info!(
            data_dir = %config.data_dir.display(),
            backend = blobs.backend(),
            "document contract opened"
        );
        let contract = Self::new(AccessGate::new(config.gate.clone()), blobs, Arc::new(ledger));
        Ok(contract.with_blob_timeout(config))
    }

    fn with_blob_timeout(mut self, config: &ServiceConfig) -> Self {
        self.service = self.service.with_blob_timeout(config.blob_timeout());
        self
    }

    pub fn service(&self) -> &DocumentService {
        &self.service
    }

    pub async fn upload_document(
        &self,
        ctx: &(impl IdentityContext + ?Sized),
        content: impl Into<Bytes>,
    ) -> DocumentResult<Cid> {
        let identity = self.service.gate().identify(ctx);
        self.service.upload_document(&identity, content.into()).await
    }

    pub async fn view_document(&self, cid: &Cid) -> DocumentResult<DocumentView> {
        self.service.view_document(cid).await
    }

    pub fn get_document_history(&self, cid: &Cid) -> DocumentResult<Vec<HistoryEntry>> {
        self.history.get_document_history(cid)
    }

    pub fn verify_document_history(&self, cid: &Cid) -> DocumentResult<usize> {
        self.history.verify_document_history(cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlobConfig;
    use crate::error::DocumentError;
    use crate::testing::{admin, contract, member, CountingBlobStore, CountingLedger};

    #[tokio::test]
    async fn upload_view_history_round() {
        let blobs = Arc::new(CountingBlobStore::default());
        let ledger = Arc::new(CountingLedger::default());
        let c = contract(blobs, ledger);

        let cid = c.upload_document(&admin(), "hello world").await.unwrap();
        let view = c.view_document(&cid).await.unwrap();
        assert_eq!(view.text(), Some("hello world"));
        assert_eq!(view.metadata.author, "admin-id");
        assert_eq!(view.metadata.organization, "OrgMSP");

        let history = c.get_document_history(&cid).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].data, view.metadata);
        assert_eq!(c.verify_document_history(&cid).unwrap(), 1);
    }

    #[tokio::test]
    async fn repeated_uploads_build_history() {
        let c = contract(Arc::default(), Arc::default());
        let mut cids = Vec::new();
        for _ in 0..4 {
            cids.push(c.upload_document(&admin(), "same bytes").await.unwrap());
        }
        assert!(cids.windows(2).all(|w| w[0] == w[1]));

        let history = c.get_document_history(&cids[0]).unwrap();
        assert_eq!(history.len(), 4);
        assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(c.verify_document_history(&cids[0]).unwrap(), 4);
    }

    #[tokio::test]
    async fn member_upload_leaves_ledger_empty() {
        let ledger = Arc::new(CountingLedger::default());
        let c = contract(Arc::default(), ledger.clone());
        let err = c.upload_document(&member(), "x").await.unwrap_err();
        assert!(matches!(err, DocumentError::PermissionDenied { .. }));
        assert!(ledger.inner.is_empty().unwrap());
    }

    #[tokio::test]
    async fn reads_need_no_identity() {
        let c = contract(Arc::default(), Arc::default());
        let cid = Cid::parse("QmUnknown").unwrap();
        assert!(matches!(
            c.view_document(&cid).await.unwrap_err(),
            DocumentError::DocumentNotFound(_)
        ));
        assert!(c.get_document_history(&cid).unwrap().is_empty());
        assert_eq!(c.verify_document_history(&cid).unwrap(), 0);
    }

    #[tokio::test]
    async fn open_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            data_dir: dir.path().to_path_buf(),
            ..ServiceConfig::default()
        };

        let cid = {
            let c = DocumentContract::open(&config).unwrap();
            c.upload_document(&admin(), "persisted").await.unwrap()
        };

        let c = DocumentContract::open(&config).unwrap();
        let view = c.view_document(&cid).await.unwrap();
        assert_eq!(view.text(), Some("persisted"));
        assert_eq!(c.get_document_history(&cid).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn open_with_memory_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            data_dir: dir.path().to_path_buf(),
            blob: BlobConfig {
                backend: BlobBackend::Memory,
                ..BlobConfig::default()
            },
            ..ServiceConfig::default()
        };
        let c = DocumentContract::open(&config).unwrap();
        assert_eq!(c.service().blobs().backend(), "memory");
        let cid = c.upload_document(&admin(), "ephemeral").await.unwrap();
        assert!(c.view_document(&cid).await.is_ok());
    }

    #[test]
    fn open_rejects_invalid_config() {
        let mut config = ServiceConfig::default();
        config.blob.chunk_size = 0;
        assert!(matches!(
            DocumentContract::open(&config),
            Err(ConfigError::Invalid(_))
        ));
    }
}

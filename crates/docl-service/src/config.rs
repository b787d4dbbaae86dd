use std::path::{Path, PathBuf};
use std::time::Duration;

use docl_gate::GateConfig;
use docl_ledger::SyncMode;
use docl_store::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which blob store backend to open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackend {
    #[default]
    Fs,
    Memory,
    Ipfs,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    pub backend: BlobBackend,
    /// Read chunk size for the local backends.
    pub chunk_size: usize,
    /// Base URL of the IPFS HTTP API.
    pub ipfs_api: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            backend: BlobBackend::Fs,
            chunk_size: DEFAULT_CHUNK_SIZE,
            ipfs_api: "http://localhost:5001".into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub sync: SyncMode,
}

/// Top-level configuration, usually read from `docl.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Root directory for the ledger and the filesystem blob store.
    pub data_dir: PathBuf,
    /// Upper bound on a single blob store call, in milliseconds. 0 disables.
    pub blob_timeout_ms: u64,
    pub gate: GateConfig,
    pub blob: BlobConfig,
    pub ledger: LedgerConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".docl"),
            blob_timeout_ms: 30_000,
            gate: GateConfig::default(),
            blob: BlobConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gate
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.blob.chunk_size == 0 {
            return Err(ConfigError::Invalid("blob.chunk_size must be positive".into()));
        }
        Ok(())
    }

    pub fn blob_timeout(&self) -> Option<Duration> {
        (self.blob_timeout_ms > 0).then(|| Duration::from_millis(self.blob_timeout_ms))
    }

    pub fn ledger_dir(&self) -> PathBuf {
        self.data_dir.join("ledger")
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }
}

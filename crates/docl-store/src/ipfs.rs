use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use docl_types::Cid;
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;

use crate::error::{BlobError, BlobResult};
use crate::traits::{BlobStore, ChunkStream};

const BACKEND: &str = "ipfs";

/// Connection settings for an IPFS (Kubo) HTTP API endpoint.
#[derive(Clone, Debug)]
pub struct IpfsConfig {
    /// Base URL of the API, e.g. `http://localhost:5001`.
    pub api_url: String,
    pub connect_timeout: Duration,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5001".into(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Blob store backed by an IPFS node.
///
/// `store` pins content through `/api/v0/add`; `retrieve` streams it from
/// `/api/v0/cat`. CIDs are whatever the node returns (typically CIDv0
/// `Qm...` strings) and are passed through verbatim.
pub struct IpfsBlobStore {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(rename = "Message", default)]
    message: String,
}

impl IpfsBlobStore {
    pub fn new(config: IpfsConfig) -> BlobResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| BlobError::unavailable(BACKEND, e))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, command: &str) -> String {
        format!("{}/api/v0/{command}", self.api_url)
    }
}

#[async_trait]
impl BlobStore for IpfsBlobStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn store(&self, content: Bytes) -> BlobResult<Cid> {
        let size = content.len();
        let part = reqwest::multipart::Part::bytes(content.to_vec()).file_name("document");
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("add"))
            .query(&[("pin", "true")])
            .multipart(form)
            .send()
            .await
            .map_err(|e| BlobError::unavailable(BACKEND, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(BlobError::unavailable(
                BACKEND,
                format!("add returned HTTP {status}: {message}"),
            ));
        }

        let added: AddResponse = response.json().await.map_err(|e| BlobError::Protocol {
            backend: BACKEND,
            reason: format!("malformed add response: {e}"),
        })?;
        let cid = Cid::parse(added.hash)?;
        tracing::debug!(cid = %cid, size, "blob added to ipfs");
        Ok(cid)
    }

    async fn retrieve(&self, cid: &Cid) -> BlobResult<ChunkStream> {
        let response = self
            .client
            .post(self.endpoint("cat"))
            .query(&[("arg", cid.as_str())])
            .send()
            .await
            .map_err(|e| BlobError::unavailable(BACKEND, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            if is_missing_object(&message) {
                return Err(BlobError::NotFound(cid.clone()));
            }
            return Err(BlobError::unavailable(
                BACKEND,
                format!("cat returned HTTP {status}: {message}"),
            ));
        }

        Ok(response
            .bytes_stream()
            .map_err(|e| BlobError::unavailable(BACKEND, e))
            .boxed())
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiError>(&body) {
        Ok(err) if !err.message.is_empty() => err.message,
        _ => body,
    }
}

fn is_missing_object(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("not found") || message.contains("no link named")
}

impl std::fmt::Debug for IpfsBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpfsBlobStore")
            .field("api_url", &self.api_url)
            .finish()
    }
}

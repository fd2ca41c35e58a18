//! Disk REST API client implementation.
//!
//! Endpoints used:
//! - `GET  /resources?path=P` - existence check / metadata
//! - `PUT  /resources?path=P` - create folder
//! - `GET  /resources/upload?path=P&overwrite=true` - obtain a write target
//! - `POST <target>` with form body `url=<source>` - trigger server-side fetch

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info, warn};

use super::models::{ResourceMetadata, UploadTarget};
use crate::providers::http::{self, retry_with_backoff, STORE_TIMEOUT};
use crate::providers::traits::{RemoteStorage, StorageError};

/// What `ensure_folder` should do after probing the folder's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FolderAction {
    /// Folder already exists, nothing to do.
    Exists,
    /// Folder is missing, create it.
    Create,
    /// Unexpected status, surface it as an error.
    Fail,
}

impl FolderAction {
    fn for_status(status: StatusCode) -> Self {
        match status {
            StatusCode::OK => FolderAction::Exists,
            StatusCode::NOT_FOUND => FolderAction::Create,
            _ => FolderAction::Fail,
        }
    }
}

/// How long to wait after the store trigger before trusting the object.
#[derive(Debug, Clone, Copy)]
enum CompletionPolicy {
    /// Fixed delay, matching the service's typical fetch latency.
    Settle(Duration),
    /// Poll resource metadata until a size shows up.
    Poll { interval: Duration, attempts: u32 },
}

/// Client for the disk resources API, authenticated with an OAuth token.
pub struct DiskClient {
    client: Client,
    base_url: String,
    token: String,
    max_retries: u32,
    completion: CompletionPolicy,
}

impl DiskClient {
    /// Create a client against `base_url` (e.g. `https://cloud-api.yandex.net/v1/disk`).
    pub fn new(base_url: &str, token: &str) -> Self {
        DiskClient {
            client: http::build_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            max_retries: http::DEFAULT_MAX_RETRIES,
            completion: CompletionPolicy::Settle(Duration::from_secs(2)),
        }
    }

    /// Set the number of additional attempts for the store trigger.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the fixed settle delay after a store trigger.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.completion = CompletionPolicy::Settle(settle);
        self
    }

    /// Poll for the stored object instead of sleeping a fixed delay.
    pub fn with_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.completion = CompletionPolicy::Poll { interval, attempts };
        self
    }

    /// Obtain a short-lived write target for `path`, with overwrite enabled.
    pub async fn upload_target(&self, path: &str) -> Result<String, StorageError> {
        let url = format!(
            "{}/resources/upload?path={}&overwrite=true",
            self.base_url, path
        );
        debug!(%path, "Requesting upload target");

        let response = self.auth(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let text = response.text().await?;
        let target: UploadTarget = serde_json::from_str(&text).map_err(|e| {
            StorageError::Format(format!(
                "upload target: {} - body: {}",
                e,
                truncate_body(&text, 500)
            ))
        })?;

        Ok(target.href)
    }

    fn auth(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("Authorization", format!("OAuth {}", self.token))
    }

    fn resource_url(&self, path: &str) -> String {
        format!("{}/resources?path={}", self.base_url, path)
    }

    /// Fetch resource metadata and return its reported size, if any.
    async fn fetch_size(&self, path: &str) -> Result<Option<u64>, StorageError> {
        let response = self
            .auth(self.client.get(self.resource_url(path)))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let metadata: ResourceMetadata = response.json().await?;
        Ok(metadata.size)
    }

    /// Wait for the server-side fetch to finish according to the configured
    /// completion policy.
    async fn await_completion(&self, path: &str) {
        match self.completion {
            CompletionPolicy::Settle(delay) => tokio::time::sleep(delay).await,
            CompletionPolicy::Poll { interval, attempts } => {
                for attempt in 1..=attempts {
                    tokio::time::sleep(interval).await;
                    match self.fetch_size(path).await {
                        Ok(Some(size)) if size > 0 => {
                            debug!(%path, size, "Stored object visible");
                            return;
                        }
                        Ok(_) => debug!(%path, attempt, "Stored object not visible yet"),
                        Err(e) => debug!(%path, attempt, error = %e, "Completion poll failed"),
                    }
                }
                warn!(%path, "Gave up waiting for the stored object to report a size");
            }
        }
    }
}

#[async_trait]
impl RemoteStorage for DiskClient {
    async fn ensure_folder(&self, folder: &str) -> Result<(), StorageError> {
        let url = self.resource_url(folder);
        let response = self.auth(self.client.get(&url)).send().await?;

        match FolderAction::for_status(response.status()) {
            FolderAction::Exists => {
                info!(%folder, "Folder already exists");
                Ok(())
            }
            FolderAction::Create => {
                info!(%folder, "Folder not found, creating");
                let response = self.auth(self.client.put(&url)).send().await?;
                if !response.status().is_success() {
                    return Err(api_error(response).await);
                }
                info!(%folder, "Folder created");
                Ok(())
            }
            FolderAction::Fail => Err(api_error(response).await),
        }
    }

    async fn store_from_url(&self, path: &str, source_url: &str) -> Result<(), StorageError> {
        retry_with_backoff(self.max_retries, |_attempt| {
            let this = self;
            async move {
                let target = this.upload_target(path).await?;
                debug!(%path, "Triggering server-side fetch");

                let response = this
                    .client
                    .post(&target)
                    .timeout(STORE_TIMEOUT)
                    .form(&[("url", source_url)])
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(api_error(response).await);
                }
                Ok(())
            }
        })
        .await?;

        self.await_completion(path).await;
        Ok(())
    }

    async fn size_of(&self, path: &str) -> Option<u64> {
        match self.fetch_size(path).await {
            Ok(size) => size,
            Err(e) => {
                warn!(%path, error = %e, "Size lookup failed");
                None
            }
        }
    }
}

/// Truncate a response body for error messages. `limit` is in bytes but the
/// cut never lands inside a multi-byte character.
fn truncate_body(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Turn a non-success response into a `StorageError::Api`.
async fn api_error(response: Response) -> StorageError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    StorageError::Api { status, message }
}

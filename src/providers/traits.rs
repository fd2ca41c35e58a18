//! Provider trait definitions and error types.
//!
//! The driver loop talks to the storage and image services through these
//! traits so orchestration can be exercised against mocks.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

/// Errors from the remote storage API.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response format: {0}")]
    Format(String),
}

/// Errors from the captioned-image API.
#[derive(Debug, Error)]
pub enum ImageSourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("caption text must not be empty")]
    EmptyCaption,
}

/// Remote storage operations the driver depends on.
#[automock]
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Create `folder` if it does not exist yet. Idempotent.
    async fn ensure_folder(&self, folder: &str) -> Result<(), StorageError>;

    /// Instruct the storage service to fetch `source_url` server-side and
    /// store it at `path`, overwriting any existing object.
    async fn store_from_url(&self, path: &str, source_url: &str) -> Result<(), StorageError>;

    /// Size of the stored object in bytes, or `None` when it cannot be
    /// determined. Lookup failures are logged by the implementation and
    /// never propagated.
    async fn size_of(&self, path: &str) -> Option<u64>;
}

/// Captioned-image lookup the driver depends on.
#[automock]
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Absolute URL of an image with `caption` rendered on it.
    async fn image_url(&self, caption: &str) -> Result<String, ImageSourceError>;
}

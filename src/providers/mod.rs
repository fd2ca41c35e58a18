//! HTTP clients for the two external services.
//!
//! `disk` wraps the cloud disk's resources REST API, `cataas` wraps the
//! captioned-image API, and `http` holds the shared client configuration
//! and the retry helper both of them use.

pub mod cataas;
pub mod disk;
pub mod http;
pub mod traits;

// Re-export commonly used types
pub use cataas::CataasClient;
pub use disk::DiskClient;
pub use traits::{ImageSource, ImageSourceError, RemoteStorage, StorageError};

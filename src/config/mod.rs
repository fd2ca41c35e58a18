//! Configuration module for the uploader.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration problems, caught before any work starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("disk token is missing (set CAT_DISK__TOKEN or disk.token)")]
    MissingToken,

    #[error("destination folder name is missing")]
    MissingFolder,

    #[error("caption list is empty")]
    NoCaptions,
}

/// Main application settings
///
/// Every field has a fallback so that missing values surface through
/// `validate()` instead of as deserialization errors.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub captions: Vec<String>,
    #[serde(default)]
    pub disk: DiskSettings,
    #[serde(default)]
    pub cataas: CataasSettings,
    #[serde(default)]
    pub upload: UploadSettings,
}

/// Disk API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiskSettings {
    /// OAuth token; expected from the environment, never from checked-in files.
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub folder: String,
    #[serde(default = "default_disk_base_url")]
    pub base_url: String,
}

/// Captioned-image API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CataasSettings {
    #[serde(default = "default_cataas_base_url")]
    pub base_url: String,
}

/// Retry and completion tuning for the store trigger
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed wait after the trigger before trusting the object.
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
    /// Poll resource metadata for a size instead of the fixed wait.
    #[serde(default)]
    pub poll_completion: bool,
    #[serde(default = "default_settle_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
}

fn default_disk_base_url() -> String {
    "https://cloud-api.yandex.net/v1/disk".to_string()
}

fn default_cataas_base_url() -> String {
    "https://cataas.com".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_settle_secs() -> u64 {
    2
}

fn default_poll_attempts() -> u32 {
    5
}

impl Default for DiskSettings {
    fn default() -> Self {
        DiskSettings {
            token: String::new(),
            folder: String::new(),
            base_url: default_disk_base_url(),
        }
    }
}

impl Default for CataasSettings {
    fn default() -> Self {
        CataasSettings {
            base_url: default_cataas_base_url(),
        }
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        UploadSettings {
            max_retries: default_max_retries(),
            settle_secs: default_settle_secs(),
            poll_completion: false,
            poll_interval_secs: default_settle_secs(),
            poll_attempts: default_poll_attempts(),
        }
    }
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with CAT_)
    /// 2. config/local.toml (gitignored)
    /// 3. config/default.toml
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("CAT")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Check the invariants the driver relies on.
    ///
    /// Folder names with unusual characters are allowed but warned about,
    /// since they tend to misbehave in path query parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.disk.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.disk.folder.trim().is_empty() {
            return Err(ConfigError::MissingFolder);
        }
        if self.captions.is_empty() {
            return Err(ConfigError::NoCaptions);
        }

        if !self
            .disk
            .folder
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            tracing::warn!(
                folder = %self.disk.folder,
                "Folder name contains characters that may cause issues"
            );
        }

        Ok(())
    }
}

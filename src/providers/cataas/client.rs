//! Captioned-image API client implementation.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::models::CatImage;
use crate::providers::http::{self, retry_with_backoff};
use crate::providers::traits::{ImageSource, ImageSourceError};

/// Client for the captioned-image API. No authentication required.
pub struct CataasClient {
    client: Client,
    base_url: String,
    max_retries: u32,
}

impl CataasClient {
    /// Create a client against `base_url` (e.g. `https://cataas.com`).
    pub fn new(base_url: &str) -> Self {
        CataasClient {
            client: http::build_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: http::DEFAULT_MAX_RETRIES,
        }
    }

    /// Set the number of additional attempts for transient failures.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn says_url(&self, caption: &str) -> String {
        format!("{}/cat/says/{}?json=true", self.base_url, caption)
    }

    /// Deterministic image URL used when the descriptor cannot be parsed.
    fn fallback_url(&self, caption: &str) -> String {
        format!("{}/cat/says/{}", self.base_url, caption)
    }

    /// Absolutize the descriptor's relative `url` against the API origin.
    fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ImageSource for CataasClient {
    async fn image_url(&self, caption: &str) -> Result<String, ImageSourceError> {
        if caption.is_empty() {
            return Err(ImageSourceError::EmptyCaption);
        }

        let url = self.says_url(caption);
        debug!(%caption, %url, "Requesting captioned image descriptor");

        retry_with_backoff(self.max_retries, |_attempt| {
            let this = self;
            let url = url.clone();
            async move {
                let response = this.client.get(&url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(ImageSourceError::Api {
                        status: status.as_u16(),
                        message,
                    });
                }

                // A malformed body is not transient; fall back to the
                // deterministic caption URL instead of retrying.
                match response.json::<CatImage>().await {
                    Ok(CatImage { url: Some(path), .. }) => Ok(this.absolute_url(&path)),
                    Ok(_) => {
                        warn!(%caption, "Image descriptor had no url field, using fallback");
                        Ok(this.fallback_url(caption))
                    }
                    Err(e) => {
                        warn!(%caption, error = %e, "Image descriptor was not valid JSON, using fallback");
                        Ok(this.fallback_url(caption))
                    }
                }
            }
        })
        .await
    }
}

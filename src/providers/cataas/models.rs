//! Response models for the captioned-image API.

use serde::Deserialize;

/// Image descriptor returned by `GET /cat/says/{text}?json=true`.
///
/// `url` is a path relative to the API origin. It has gone missing from
/// responses before, so the client treats its absence as a malformed body
/// and falls back to a deterministic URL.
#[derive(Debug, Deserialize)]
pub struct CatImage {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

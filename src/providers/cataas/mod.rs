//! Captioned cat image provider.
//!
//! Wraps the public image API: `GET /cat/says/{text}?json=true` returns a
//! descriptor whose `url` points at an image with the caption rendered on it.

mod client;
mod models;

pub use client::CataasClient;

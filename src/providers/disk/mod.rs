//! Cloud disk storage provider.
//!
//! Talks to the disk's `resources` REST API with an OAuth token:
//! folder management, upload targets, server-side fetch-from-URL,
//! and size lookup.

mod client;
mod models;

pub use client::DiskClient;

//! Batch upload orchestration and the run report it produces.

pub mod orchestrator;
pub mod report;

pub use orchestrator::Uploader;
pub use report::{RunReport, UploadRecord, UploadStatus};

//! cat-uploader
//!
//! Fetches captioned cat images from a public image API and stores them in a
//! cloud disk folder via the disk's server-side fetch endpoint, writing a
//! JSON report (`files_info.json`) of the run.
//!
//! Exit code 0 means every caption was stored; 1 means at least one failed
//! or a fatal error stopped the run before processing.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};

mod config;
mod providers;
mod upload;

use crate::config::Settings;
use crate::providers::{CataasClient, DiskClient};
use crate::upload::{RunReport, Uploader};

const REPORT_FILE: &str = "files_info.json";

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cat_uploader=info".parse().unwrap()),
        )
        .init();

    match run().await {
        Ok(report) if !report.has_failures() => ExitCode::SUCCESS,
        Ok(report) => {
            error!(
                failed = report.summary.failed,
                "Some uploads failed, check the report"
            );
            ExitCode::from(1)
        }
        Err(e) => {
            error!(error = %e, "Critical error");
            ExitCode::from(1)
        }
    }
}

async fn run() -> anyhow::Result<RunReport> {
    let settings = Settings::load().context("Failed to load configuration")?;
    settings.validate()?;

    info!(
        folder = %settings.disk.folder,
        captions = settings.captions.len(),
        "Starting cat image upload run"
    );

    let mut storage = DiskClient::new(&settings.disk.base_url, &settings.disk.token)
        .with_max_retries(settings.upload.max_retries)
        .with_settle(Duration::from_secs(settings.upload.settle_secs));
    if settings.upload.poll_completion {
        storage = storage.with_polling(
            Duration::from_secs(settings.upload.poll_interval_secs),
            settings.upload.poll_attempts,
        );
    }

    let source =
        CataasClient::new(&settings.cataas.base_url).with_max_retries(settings.upload.max_retries);

    let uploader = Uploader::new(storage, source);
    let report = uploader.run(&settings.disk.folder, &settings.captions).await?;

    // A report that cannot be written is logged but does not change the
    // run's outcome; the uploads already happened.
    if let Err(e) = report.write_to(Path::new(REPORT_FILE)).await {
        error!(error = %e, report = REPORT_FILE, "Failed to write the run report");
    } else {
        info!(report = REPORT_FILE, "Saved upload report");
    }

    Ok(report)
}

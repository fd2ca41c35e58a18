//! Sequential upload loop.
//!
//! Processes captions one at a time: fetch a captioned image URL, trigger a
//! server-side store, verify the stored size, and record the outcome. A
//! failing caption is recorded and never aborts the rest of the run; only
//! folder creation is fatal.

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use super::report::{RunReport, UploadRecord, UploadStatus};
use crate::providers::traits::{ImageSource, ImageSourceError, RemoteStorage, StorageError};

/// Derive the stored filename for a caption: spaces become underscores,
/// `.jpg` suffix.
pub fn filename_for(caption: &str) -> String {
    format!("{}.jpg", caption.replace(' ', "_"))
}

/// Folder-prefixed remote path for a filename.
pub fn remote_path(folder: &str, filename: &str) -> String {
    format!("/{}/{}", folder, filename)
}

/// Per-caption failure, from either provider.
#[derive(Debug, Error)]
enum CaptionError {
    #[error(transparent)]
    Source(#[from] ImageSourceError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Drives the per-caption upload loop against the two provider clients.
pub struct Uploader<S, I>
where
    S: RemoteStorage,
    I: ImageSource,
{
    storage: S,
    source: I,
}

impl<S, I> Uploader<S, I>
where
    S: RemoteStorage,
    I: ImageSource,
{
    pub fn new(storage: S, source: I) -> Self {
        Uploader { storage, source }
    }

    /// Run the whole batch and build the report.
    ///
    /// Folder creation failure is fatal and returned as an error; everything
    /// after that is recorded per caption instead.
    #[instrument(skip(self, captions), fields(caption_count = captions.len()))]
    pub async fn run(&self, folder: &str, captions: &[String]) -> Result<RunReport, StorageError> {
        self.storage.ensure_folder(folder).await?;

        let progress = ProgressBar::new(captions.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}").unwrap(),
        );

        let mut files = Vec::with_capacity(captions.len());
        for caption in captions {
            progress.set_message(caption.clone());
            files.push(self.process_caption(folder, caption).await);
            progress.inc(1);
        }
        progress.finish_and_clear();

        let report = RunReport::new(folder, files);
        info!(
            successful = report.summary.successful,
            failed = report.summary.failed,
            "Batch finished"
        );
        Ok(report)
    }

    #[instrument(skip(self, folder))]
    async fn process_caption(&self, folder: &str, caption: &str) -> UploadRecord {
        let filename = filename_for(caption);
        let path = remote_path(folder, &filename);

        match self.try_upload(caption, &path).await {
            Ok(size) => {
                let status = match size {
                    Some(s) if s > 0 => {
                        info!(%filename, size = s, "Upload verified");
                        UploadStatus::Success
                    }
                    _ => {
                        warn!(%filename, "Uploaded but size is zero or unknown");
                        UploadStatus::UploadedButSizeUnknown
                    }
                };
                UploadRecord {
                    filename,
                    text: caption.to_string(),
                    size: size.unwrap_or(0),
                    path,
                    status,
                    error: None,
                }
            }
            Err(e) => {
                error!(%caption, error = %e, "Failed to process caption");
                UploadRecord {
                    filename,
                    text: caption.to_string(),
                    size: 0,
                    path,
                    status: UploadStatus::Failed,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn try_upload(&self, caption: &str, path: &str) -> Result<Option<u64>, CaptionError> {
        info!(%caption, "Fetching captioned image URL");
        let image_url = self.source.image_url(caption).await?;

        info!(%path, "Storing image on the disk service");
        self.storage.store_from_url(path, &image_url).await?;

        Ok(self.storage.size_of(path).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::traits::{MockImageSource, MockRemoteStorage};

    fn captions(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn filenames_replace_spaces_with_underscores() {
        assert_eq!(filename_for("big cat"), "big_cat.jpg");
        assert_eq!(filename_for("hello"), "hello.jpg");
        assert_eq!(remote_path("cats", &filename_for("big cat")), "/cats/big_cat.jpg");
    }

    #[tokio::test]
    async fn records_success_and_size_unknown() {
        let mut storage = MockRemoteStorage::new();
        storage
            .expect_ensure_folder()
            .times(1)
            .returning(|_| Ok(()));
        storage
            .expect_store_from_url()
            .times(2)
            .returning(|_, _| Ok(()));
        storage
            .expect_size_of()
            .withf(|path| path == "/cats/hello.jpg")
            .returning(|_| Some(1234));
        storage
            .expect_size_of()
            .withf(|path| path == "/cats/world.jpg")
            .returning(|_| Some(0));

        let mut source = MockImageSource::new();
        source
            .expect_image_url()
            .times(2)
            .returning(|caption| Ok(format!("https://cataas.example/cat/says/{}", caption)));

        let uploader = Uploader::new(storage, source);
        let report = uploader
            .run("cats", &captions(&["hello", "world"]))
            .await
            .unwrap();

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.successful, 2);
        assert_eq!(report.summary.failed, 0);
        assert_eq!(report.summary.folder, "cats");

        assert_eq!(report.files[0].filename, "hello.jpg");
        assert_eq!(report.files[0].status, UploadStatus::Success);
        assert_eq!(report.files[0].size, 1234);

        assert_eq!(report.files[1].filename, "world.jpg");
        assert_eq!(report.files[1].status, UploadStatus::UploadedButSizeUnknown);
        assert_eq!(report.files[1].size, 0);
    }

    #[tokio::test]
    async fn exhausted_store_is_recorded_as_failed() {
        let mut storage = MockRemoteStorage::new();
        storage.expect_ensure_folder().returning(|_| Ok(()));
        storage
            .expect_store_from_url()
            .times(1)
            .returning(|_, _| {
                Err(StorageError::Api {
                    status: 503,
                    message: "service unavailable".to_string(),
                })
            });
        // The size lookup must not run for a failed store.
        storage.expect_size_of().times(0);

        let mut source = MockImageSource::new();
        source
            .expect_image_url()
            .returning(|_| Ok("https://cataas.example/cat/says/hello".to_string()));

        let uploader = Uploader::new(storage, source);
        let report = uploader.run("cats", &captions(&["hello"])).await.unwrap();

        assert_eq!(report.summary.total, 1);
        assert_eq!(report.summary.successful, 0);
        assert_eq!(report.summary.failed, 1);

        let record = &report.files[0];
        assert_eq!(record.status, UploadStatus::Failed);
        assert_eq!(record.size, 0);
        assert!(record.error.as_deref().unwrap_or("").contains("503"));
    }

    #[tokio::test]
    async fn one_bad_caption_does_not_block_the_rest() {
        let mut storage = MockRemoteStorage::new();
        storage.expect_ensure_folder().returning(|_| Ok(()));
        storage
            .expect_store_from_url()
            .times(1)
            .returning(|_, _| Ok(()));
        storage.expect_size_of().returning(|_| Some(42));

        let mut source = MockImageSource::new();
        source
            .expect_image_url()
            .withf(|caption| caption.is_empty())
            .returning(|_| Err(ImageSourceError::EmptyCaption));
        source
            .expect_image_url()
            .withf(|caption| !caption.is_empty())
            .returning(|caption| Ok(format!("https://cataas.example/cat/says/{}", caption)));

        let uploader = Uploader::new(storage, source);
        let report = uploader.run("cats", &captions(&["", "hello"])).await.unwrap();

        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.files[0].status, UploadStatus::Failed);
        assert!(report.files[0].error.is_some());
        assert_eq!(report.files[1].status, UploadStatus::Success);
        assert_eq!(report.files[1].size, 42);
    }

    #[tokio::test]
    async fn folder_failure_aborts_the_run() {
        let mut storage = MockRemoteStorage::new();
        storage.expect_ensure_folder().returning(|_| {
            Err(StorageError::Api {
                status: 401,
                message: "unauthorized".to_string(),
            })
        });
        storage.expect_store_from_url().times(0);

        let mut source = MockImageSource::new();
        source.expect_image_url().times(0);

        let uploader = Uploader::new(storage, source);
        let result = uploader.run("cats", &captions(&["hello"])).await;

        assert!(matches!(result, Err(StorageError::Api { status: 401, .. })));
    }
}

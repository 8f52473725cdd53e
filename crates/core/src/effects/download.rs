use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::backend::{BackendError, ConversionBackend};

/// Starts the download of a finished artifact.
///
/// Fire-and-forget: implementations must return immediately and never report
/// failure to the caller.
pub trait Downloader: Send + Sync {
    fn trigger(&self, output_file: &str);
}

/// Downloads artifacts from the backend into a local directory.
pub struct FileDownloader {
    backend: Arc<dyn ConversionBackend>,
    dir: PathBuf,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl FileDownloader {
    pub fn new(backend: Arc<dyn ConversionBackend>, dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            dir: dir.into(),
            in_flight: Mutex::new(Vec::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Wait for every download started so far.
    pub async fn drain(&self) {
        let handles: Vec<_> = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect();
        futures::future::join_all(handles).await;
    }

    async fn download(
        backend: Arc<dyn ConversionBackend>,
        dir: PathBuf,
        output_file: String,
    ) -> Result<PathBuf, BackendError> {
        // Only the final component is used; the name comes from the backend.
        let file_name = Path::new(&output_file).file_name().ok_or_else(|| {
            BackendError::InvalidResponse(format!("unusable output file name '{}'", output_file))
        })?;
        let target = dir.join(file_name);

        let bytes = backend.fetch_artifact(&output_file).await?;
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(&target, bytes).await?;
        Ok(target)
    }
}

impl Downloader for FileDownloader {
    fn trigger(&self, output_file: &str) {
        let backend = Arc::clone(&self.backend);
        let dir = self.dir.clone();
        let output_file = output_file.to_string();

        let handle = tokio::spawn(async move {
            match Self::download(backend, dir, output_file.clone()).await {
                Ok(path) => info!("Downloaded {} to {:?}", output_file, path),
                Err(e) => warn!("Download of {} failed: {}", output_file, e),
            }
        });

        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(handle);
    }
}

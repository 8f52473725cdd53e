//! Side effects fired when a task succeeds.
//!
//! Each distinct output file gets its preview rendered and its download
//! triggered at most once, however many success notifications arrive.

mod download;
mod ledger;
mod preview;

pub use download::{Downloader, FileDownloader};
pub use ledger::DownloadLedger;
pub use preview::{Preview, PreviewKind, AUDIO_PREVIEW_EXTENSIONS, VIDEO_PREVIEW_EXTENSIONS};

use std::sync::Arc;

use tracing::debug;

use crate::backend::ConversionBackend;
use crate::metrics::DOWNLOADS_TRIGGERED;
use crate::presenter::Presenter;

pub struct SideEffectDispatcher {
    ledger: DownloadLedger,
    backend: Arc<dyn ConversionBackend>,
    presenter: Arc<dyn Presenter>,
    downloader: Option<Arc<dyn Downloader>>,
    show_previews: bool,
}

impl SideEffectDispatcher {
    /// Dispatcher that renders previews and downloads nothing.
    pub fn new(backend: Arc<dyn ConversionBackend>, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            ledger: DownloadLedger::new(),
            backend,
            presenter,
            downloader: None,
            show_previews: true,
        }
    }

    pub fn with_downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn with_previews(mut self, show_previews: bool) -> Self {
        self.show_previews = show_previews;
        self
    }

    pub fn ledger(&self) -> &DownloadLedger {
        &self.ledger
    }

    /// Fire the success side effects for `output_file`, once per name.
    pub fn on_success(&self, output_file: &str) {
        // Claim first; a concurrent duplicate must see the entry.
        if !self.ledger.claim(output_file) {
            debug!("Side effects for {} already fired, skipping", output_file);
            return;
        }

        if self.show_previews {
            let preview = Preview::new(output_file, self.backend.preview_url(output_file));
            self.presenter.preview_ready(&preview);
        }

        if let Some(downloader) = &self.downloader {
            DOWNLOADS_TRIGGERED.inc();
            downloader.trigger(output_file);
        }
    }
}

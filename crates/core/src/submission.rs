//! Submission dispatcher - turns the current selection into tasks.
//!
//! One request is sent for the whole selection. Either every descriptor in
//! the response becomes a task, or (on any failure) none does.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{BackendError, ConversionBackend, ConversionRequest};
use crate::metrics::SUBMISSIONS;
use crate::poller::Task;
use crate::selection::Selection;

/// Why a submission created no tasks.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Select at least one file")]
    EmptySelection,

    #[error("Select the output format")]
    EmptyFormat,

    #[error("Conversion request rejected: {0}")]
    Rejected(String),

    #[error("Conversion request failed: {0}")]
    Transport(#[source] BackendError),
}

impl SubmitError {
    /// Input errors the user can fix before resubmitting.
    pub fn is_validation(&self) -> bool {
        matches!(self, SubmitError::EmptySelection | SubmitError::EmptyFormat)
    }
}

impl From<BackendError> for SubmitError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Rejected(message) => SubmitError::Rejected(message),
            other => SubmitError::Transport(other),
        }
    }
}

pub struct SubmissionDispatcher {
    backend: Arc<dyn ConversionBackend>,
}

impl SubmissionDispatcher {
    pub fn new(backend: Arc<dyn ConversionBackend>) -> Self {
        Self { backend }
    }

    /// Validate, send one request, and build a `Running` task per returned descriptor.
    pub async fn submit(
        &self,
        selection: &Selection,
        target_format: &str,
        quality_level: u32,
    ) -> Result<Vec<Task>, SubmitError> {
        if selection.is_empty() {
            return Err(SubmitError::EmptySelection);
        }
        let target_format = target_format.trim();
        if target_format.is_empty() {
            return Err(SubmitError::EmptyFormat);
        }

        let request = ConversionRequest {
            files: selection.iter().cloned().collect(),
            target_format: target_format.to_string(),
            quality_level,
        };

        info!(
            "Submitting {} file(s) to {} backend as {} (quality {})",
            request.files.len(),
            self.backend.name(),
            request.target_format,
            quality_level
        );

        let descriptors = match self.backend.submit(&request).await {
            Ok(descriptors) => descriptors,
            Err(e) => {
                SUBMISSIONS.with_label_values(&["error"]).inc();
                warn!("Submission failed: {}", e);
                return Err(e.into());
            }
        };
        SUBMISSIONS.with_label_values(&["success"]).inc();

        if descriptors.len() != request.files.len() {
            warn!(
                "Backend returned {} task(s) for {} file(s)",
                descriptors.len(),
                request.files.len()
            );
        }

        Ok(descriptors.into_iter().map(Task::from_descriptor).collect())
    }
}

//! Recording presenter and downloader for testing.

use std::sync::Mutex;

use crate::backend::TaskId;
use crate::effects::{Downloader, Preview};
use crate::poller::{Task, TaskState};
use crate::presenter::Presenter;
use crate::submission::SubmitError;

/// A recorded presenter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    Created {
        task_id: TaskId,
        output_file: String,
    },
    Updated {
        task_id: TaskId,
        state: TaskState,
        progress_pct: u8,
    },
    Preview(Preview),
    SubmissionFailed(String),
}

/// Presenter that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls.
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Recorded calls concerning one task.
    pub fn events_for(&self, task_id: &TaskId) -> Vec<PresenterEvent> {
        self.events()
            .into_iter()
            .filter(|e| match e {
                PresenterEvent::Created { task_id: id, .. }
                | PresenterEvent::Updated { task_id: id, .. } => id == task_id,
                _ => false,
            })
            .collect()
    }

    /// Previews shown so far.
    pub fn previews(&self) -> Vec<Preview> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PresenterEvent::Preview(preview) => Some(preview),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: PresenterEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn task_created(&self, task: &Task) {
        self.record(PresenterEvent::Created {
            task_id: task.task_id.clone(),
            output_file: task.output_file.clone(),
        });
    }

    fn task_updated(&self, task: &Task) {
        self.record(PresenterEvent::Updated {
            task_id: task.task_id.clone(),
            state: task.state,
            progress_pct: task.progress_pct(),
        });
    }

    fn preview_ready(&self, preview: &Preview) {
        self.record(PresenterEvent::Preview(preview.clone()));
    }

    fn submission_failed(&self, error: &SubmitError) {
        self.record(PresenterEvent::SubmissionFailed(error.to_string()));
    }
}

/// Downloader that only records which artifacts were triggered.
#[derive(Debug, Default)]
pub struct MockDownloader {
    triggered: Mutex<Vec<String>>,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triggered(&self) -> Vec<String> {
        self.triggered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Downloader for MockDownloader {
    fn trigger(&self, output_file: &str) {
        self.triggered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(output_file.to_string());
    }
}

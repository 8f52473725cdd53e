//! Presentation adapter - the only component that touches the visual surface.
//!
//! The orchestrator calls into a [`Presenter`] on every task transition.
//! Calls are synchronous and must not panic; nothing the presenter does
//! feeds back into task bookkeeping.

use tracing::{error, info};

use crate::effects::Preview;
use crate::poller::{Task, TaskState};
use crate::submission::SubmitError;

pub trait Presenter: Send + Sync {
    /// A task card appears for a freshly submitted task.
    fn task_created(&self, task: &Task);

    /// The task's state or progress changed.
    fn task_updated(&self, task: &Task);

    /// A finished artifact can be previewed.
    fn preview_ready(&self, preview: &Preview);

    /// A submission produced no tasks.
    fn submission_failed(&self, error: &SubmitError);
}

/// Presenter that writes everything to the tracing log.
#[derive(Debug, Default, Clone)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn task_created(&self, task: &Task) {
        info!(
            task_id = %task.task_id,
            "{} -> {}: processing",
            task.input_file,
            task.output_file
        );
    }

    fn task_updated(&self, task: &Task) {
        match task.state {
            TaskState::Running => info!(
                task_id = %task.task_id,
                "{}: {}%",
                task.output_file,
                task.progress_pct()
            ),
            TaskState::Succeeded => info!(task_id = %task.task_id, "{}: completed", task.output_file),
            TaskState::Failed => error!(task_id = %task.task_id, "{}: error", task.output_file),
        }
    }

    fn preview_ready(&self, preview: &Preview) {
        info!(
            "{} preview available at {}",
            preview.kind.as_str(),
            preview.url
        );
    }

    fn submission_failed(&self, error: &SubmitError) {
        error!("{}", error);
    }
}

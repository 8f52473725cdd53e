//! Types for conversion tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::{TaskDescriptor, TaskId};

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Submitted; status queries continue.
    Running,
    /// Backend reported success. Terminal.
    Succeeded,
    /// Backend reported failure or an unrecognized status. Terminal.
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
        }
    }
}

/// One conversion job, from submission to terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub input_file: String,
    /// Name of the produced file; key for preview/download deduplication.
    pub output_file: String,
    pub state: TaskState,
    /// Status queries performed so far.
    pub poll_attempt: u32,
    pub submitted_at: DateTime<Utc>,
}

impl Task {
    pub fn from_descriptor(descriptor: TaskDescriptor) -> Self {
        Self {
            task_id: descriptor.task_id,
            input_file: descriptor.input_file,
            output_file: descriptor.output_file,
            state: TaskState::Running,
            poll_attempt: 0,
            submitted_at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Move to a terminal state. Returns `false` (and changes nothing) if
    /// the task already finished or `state` is not terminal.
    pub fn finish(&mut self, state: TaskState) -> bool {
        if self.is_terminal() || !state.is_terminal() {
            return false;
        }
        self.state = state;
        true
    }

    /// Progress indicator shown to the user.
    ///
    /// The backend does not report real progress, so a running task that has
    /// been seen in progress sits at the midpoint.
    pub fn progress_pct(&self) -> u8 {
        match self.state {
            TaskState::Running if self.poll_attempt == 0 => 0,
            TaskState::Running => 50,
            TaskState::Succeeded | TaskState::Failed => 100,
        }
    }
}

/// Snapshot of every task tracked by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    pub total: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl OrchestratorStatus {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut status = Self::default();
        for task in tasks {
            status.total += 1;
            match task.state {
                TaskState::Running => status.running += 1,
                TaskState::Succeeded => status.succeeded += 1,
                TaskState::Failed => status.failed += 1,
            }
        }
        status
    }

    pub fn all_finished(&self) -> bool {
        self.running == 0
    }
}

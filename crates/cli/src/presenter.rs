use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use convertino_core::{Presenter, Preview, SubmitError, Task, TaskId, TaskState};

/// Prints one line per task transition to stdout.
///
/// Running updates are only printed when the percentage changes, so a task
/// polled every couple of seconds does not flood the terminal.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    last_progress: Mutex<HashMap<TaskId, u8>>,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the task's progress; `false` if it was already shown.
    fn changed(&self, task: &Task) -> bool {
        let pct = task.progress_pct();
        let mut seen = self
            .last_progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        seen.insert(task.task_id.clone(), pct) != Some(pct)
    }

    fn line(&self, text: String) {
        // Presenter calls are infallible; write errors are dropped.
        let _ = writeln!(std::io::stdout().lock(), "{}", text);
    }
}

impl Presenter for TerminalPresenter {
    fn task_created(&self, task: &Task) {
        self.changed(task);
        self.line(format!(
            "[{}] {} -> {}  processing  {:>3}%",
            task.task_id,
            task.input_file,
            task.output_file,
            task.progress_pct()
        ));
    }

    fn task_updated(&self, task: &Task) {
        if !self.changed(task) {
            return;
        }
        let badge = match task.state {
            TaskState::Running => "processing",
            TaskState::Succeeded => "completed",
            TaskState::Failed => "error",
        };
        self.line(format!(
            "[{}] {}  {}  {:>3}%",
            task.task_id,
            task.output_file,
            badge,
            task.progress_pct()
        ));
    }

    fn preview_ready(&self, preview: &Preview) {
        self.line(format!(
            "  {} preview: {}",
            preview.kind.as_str(),
            preview.url
        ));
    }

    fn submission_failed(&self, error: &SubmitError) {
        let _ = writeln!(std::io::stderr().lock(), "error: {}", error);
    }
}

//! Per-task polling loop.
//!
//! A [`TaskPoller`] owns one task and drives it from `Running` to a terminal
//! state:
//! - in progress: notify, wait the progress interval, query again
//! - done with success: `Succeeded`, notify, fire side effects, stop
//! - done without success, or unknown status: `Failed`, notify, stop
//! - query failed: state unchanged, wait the retry interval, query again
//!
//! Queries of one task are strictly sequential: the next one is only issued
//! after the previous answer (or failure) and the following delay.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, ConversionBackend, RemoteStatus, StatusReport};
use crate::clock::Clock;
use crate::effects::SideEffectDispatcher;
use crate::metrics::{STATUS_POLLS, TASKS_FINISHED};
use crate::presenter::Presenter;

use super::config::PollerConfig;
use super::types::{Task, TaskState};

/// What the loop does after one status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// Task still in progress; query again after the progress interval.
    KeepPolling,
    /// Query failed; query again after the retry interval.
    Retry,
    Succeed,
    Fail,
}

/// Classify the result of one status query.
pub fn decide(result: &Result<StatusReport, BackendError>) -> PollDecision {
    match result {
        Ok(report) => match report.status {
            RemoteStatus::Running => PollDecision::KeepPolling,
            RemoteStatus::Done if report.success == Some(true) => PollDecision::Succeed,
            RemoteStatus::Done | RemoteStatus::Other(_) => PollDecision::Fail,
        },
        Err(_) => PollDecision::Retry,
    }
}

fn poll_label(result: &Result<StatusReport, BackendError>) -> &'static str {
    match result {
        Ok(report) => match report.status {
            RemoteStatus::Running => "running",
            RemoteStatus::Done => "done",
            RemoteStatus::Other(_) => "other",
        },
        Err(_) => "transport_error",
    }
}

/// The task's entry in the orchestrator's board. Only its poller writes it.
pub(crate) struct TaskSlot {
    pub(crate) board: Arc<RwLock<Vec<Task>>>,
    pub(crate) index: usize,
}

impl TaskSlot {
    async fn store(&self, task: &Task) {
        if let Some(entry) = self.board.write().await.get_mut(self.index) {
            *entry = task.clone();
        }
    }
}

/// Drives one task to a terminal state.
pub struct TaskPoller {
    task: Task,
    config: PollerConfig,
    backend: Arc<dyn ConversionBackend>,
    clock: Arc<dyn Clock>,
    presenter: Arc<dyn Presenter>,
    effects: Arc<SideEffectDispatcher>,
    slot: Option<TaskSlot>,
}

impl TaskPoller {
    pub fn new(
        task: Task,
        config: PollerConfig,
        backend: Arc<dyn ConversionBackend>,
        clock: Arc<dyn Clock>,
        presenter: Arc<dyn Presenter>,
        effects: Arc<SideEffectDispatcher>,
    ) -> Self {
        Self {
            task,
            config,
            backend,
            clock,
            presenter,
            effects,
            slot: None,
        }
    }

    pub(crate) fn with_slot(mut self, slot: TaskSlot) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Poll until the task is terminal and return its final snapshot.
    pub async fn run(mut self) -> Task {
        debug!(task_id = %self.task.task_id, "Poller started");
        let mut consecutive_failures: u32 = 0;

        while !self.task.is_terminal() {
            self.task.poll_attempt += 1;
            let result = self.backend.task_status(&self.task.task_id).await;
            STATUS_POLLS.with_label_values(&[poll_label(&result)]).inc();

            match decide(&result) {
                PollDecision::KeepPolling => {
                    consecutive_failures = 0;
                    self.publish().await;
                    self.clock.sleep(self.config.progress_interval()).await;
                }
                PollDecision::Retry => {
                    consecutive_failures += 1;
                    if let Err(e) = &result {
                        warn!(
                            task_id = %self.task.task_id,
                            "Status query {} failed ({}), retrying in {}ms",
                            self.task.poll_attempt,
                            e,
                            self.config.retry_interval_ms
                        );
                    }

                    if let Some(max) = self.config.max_transport_retries {
                        if consecutive_failures >= max {
                            warn!(
                                task_id = %self.task.task_id,
                                "Giving up after {} consecutive failed queries",
                                consecutive_failures
                            );
                            self.finish(TaskState::Failed).await;
                            break;
                        }
                    }

                    if let Some(slot) = &self.slot {
                        slot.store(&self.task).await;
                    }
                    self.clock.sleep(self.config.retry_interval()).await;
                }
                PollDecision::Succeed => {
                    self.finish(TaskState::Succeeded).await;
                    self.effects.on_success(&self.task.output_file);
                }
                PollDecision::Fail => {
                    if let Ok(report) = &result {
                        debug!(task_id = %self.task.task_id, "Terminal report: {:?}", report);
                    }
                    self.finish(TaskState::Failed).await;
                }
            }
        }

        self.task
    }

    async fn finish(&mut self, state: TaskState) {
        if self.task.finish(state) {
            TASKS_FINISHED.with_label_values(&[state.as_str()]).inc();
            info!(
                task_id = %self.task.task_id,
                "Task {} after {} quer{}",
                state.as_str(),
                self.task.poll_attempt,
                if self.task.poll_attempt == 1 { "y" } else { "ies" }
            );
            self.publish().await;
        }
    }

    /// Store the snapshot and show it.
    async fn publish(&self) {
        if let Some(slot) = &self.slot {
            slot.store(&self.task).await;
        }
        self.presenter.task_updated(&self.task);
    }
}

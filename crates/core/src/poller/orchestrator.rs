//! Conversion orchestrator.
//!
//! Submits a selection, registers the resulting tasks, and runs one
//! [`TaskPoller`] per task. Pollers are independent: a slow or failing task
//! never delays another, and every poller stops once its task is terminal.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, error, info};

use crate::backend::ConversionBackend;
use crate::clock::{Clock, TokioClock};
use crate::effects::SideEffectDispatcher;
use crate::presenter::Presenter;
use crate::selection::Selection;
use crate::submission::{SubmissionDispatcher, SubmitError};

use super::config::PollerConfig;
use super::runner::{TaskPoller, TaskSlot};
use super::types::{OrchestratorStatus, Task};

pub struct ConversionOrchestrator {
    config: PollerConfig,
    backend: Arc<dyn ConversionBackend>,
    dispatcher: SubmissionDispatcher,
    effects: Arc<SideEffectDispatcher>,
    presenter: Arc<dyn Presenter>,
    clock: Arc<dyn Clock>,

    // Runtime state
    board: Arc<RwLock<Vec<Task>>>,
    pollers: Mutex<JoinSet<Task>>,
    /// Every poller ever spawned, reachable while `wait_all` owns the set.
    abort_handles: Mutex<Vec<AbortHandle>>,
}

impl ConversionOrchestrator {
    pub fn new(
        config: PollerConfig,
        backend: Arc<dyn ConversionBackend>,
        effects: Arc<SideEffectDispatcher>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            config,
            dispatcher: SubmissionDispatcher::new(Arc::clone(&backend)),
            backend,
            effects,
            presenter,
            clock: Arc::new(TokioClock::new()),
            board: Arc::new(RwLock::new(Vec::new())),
            pollers: Mutex::new(JoinSet::new()),
            abort_handles: Mutex::new(Vec::new()),
        }
    }

    /// Replace the time source used by pollers started after this call.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn effects(&self) -> &SideEffectDispatcher {
        &self.effects
    }

    /// Submit the selection and start polling every created task.
    ///
    /// Returns the tasks as created. On error no task is registered and the
    /// presenter is told why.
    pub async fn submit(
        &self,
        selection: &Selection,
        target_format: &str,
        quality_level: u32,
    ) -> Result<Vec<Task>, SubmitError> {
        let tasks = match self
            .dispatcher
            .submit(selection, target_format, quality_level)
            .await
        {
            Ok(tasks) => tasks,
            Err(e) => {
                self.presenter.submission_failed(&e);
                return Err(e);
            }
        };

        let mut board = self.board.write().await;
        let mut pollers = self.pollers.lock().await;
        let mut abort_handles = self.abort_handles.lock().await;
        abort_handles.retain(|h| !h.is_finished());
        for task in &tasks {
            let index = board.len();
            board.push(task.clone());
            self.presenter.task_created(task);

            let poller = TaskPoller::new(
                task.clone(),
                self.config.clone(),
                Arc::clone(&self.backend),
                Arc::clone(&self.clock),
                Arc::clone(&self.presenter),
                Arc::clone(&self.effects),
            )
            .with_slot(TaskSlot {
                board: Arc::clone(&self.board),
                index,
            });
            abort_handles.push(pollers.spawn(poller.run()));
            debug!(task_id = %task.task_id, "Spawned poller");
        }

        info!("Tracking {} new task(s), {} total", tasks.len(), board.len());
        Ok(tasks)
    }

    /// Snapshot of every task in submission order.
    pub async fn tasks(&self) -> Vec<Task> {
        self.board.read().await.clone()
    }

    pub async fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus::from_tasks(self.board.read().await.iter())
    }

    /// Wait until every poller started so far has finished.
    pub async fn wait_all(&self) -> OrchestratorStatus {
        let mut pollers = std::mem::take(&mut *self.pollers.lock().await);
        while let Some(result) = pollers.join_next().await {
            match result {
                Ok(task) => debug!(task_id = %task.task_id, "Poller finished ({})", task.state.as_str()),
                Err(e) if e.is_cancelled() => debug!("Poller cancelled"),
                Err(e) => error!("Poller panicked: {}", e),
            }
        }
        self.status().await
    }

    /// Stop every running poller. Tasks keep their last known state.
    ///
    /// Also stops pollers a concurrent `wait_all` is waiting on; that call
    /// then returns.
    pub async fn abandon(&self) {
        let handles = std::mem::take(&mut *self.abort_handles.lock().await);
        let running = handles.iter().filter(|h| !h.is_finished()).count();
        if running > 0 {
            info!("Abandoning {} poller(s)", running);
        }
        for handle in handles {
            handle.abort();
        }
        self.pollers.lock().await.abort_all();
    }
}

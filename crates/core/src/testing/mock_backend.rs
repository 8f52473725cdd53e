//! Mock conversion backend for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::backend::{
    BackendError, ConversionBackend, ConversionRequest, StatusReport, TaskDescriptor, TaskId,
};
use crate::clock::Clock;

/// One scripted answer to a status query.
#[derive(Debug, Clone)]
pub enum ScriptedStatus {
    /// Answer with this report.
    Report(StatusReport),
    /// Fail the query as if the backend were unreachable.
    TransportError,
}

/// A recorded status query for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedStatusCall {
    pub task_id: TaskId,
    /// Clock reading when the query arrived (zero without a clock).
    pub at: Duration,
}

/// Mock implementation of the ConversionBackend trait.
///
/// Provides controllable behavior for testing:
/// - Script the status answers of each task
/// - Record submissions and status queries with their timing
/// - Simulate submission and download failures
///
/// Tasks without a script report `running` forever. Without a configured
/// submit response, every submitted file gets a task `task-N` whose output is
/// the file stem with the target format as extension.
///
/// # Example
///
/// ```rust,ignore
/// let backend = MockBackend::new();
/// backend
///     .script_status(&TaskId::new("t1"), vec![
///         ScriptedStatus::Report(StatusReport::running()),
///         ScriptedStatus::Report(StatusReport::done(true)),
///     ])
///     .await;
///
/// // ... run pollers ...
///
/// assert_eq!(backend.status_call_count(&TaskId::new("t1")).await, 2);
/// ```
pub struct MockBackend {
    /// Remaining scripted answers per task.
    scripts: Arc<RwLock<HashMap<TaskId, VecDeque<ScriptedStatus>>>>,
    /// Recorded status queries, in arrival order.
    status_calls: Arc<RwLock<Vec<RecordedStatusCall>>>,
    /// Recorded submit calls.
    submissions: Arc<RwLock<Vec<ConversionRequest>>>,
    /// Fixed descriptors returned by submit, if set.
    submit_response: Arc<RwLock<Option<Vec<TaskDescriptor>>>>,
    /// If set, the next submit fails.
    fail_next_submit: Arc<RwLock<bool>>,
    /// Artifact bytes by output file.
    artifacts: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    /// If set, every artifact fetch fails.
    artifacts_unavailable: Arc<RwLock<bool>>,
    /// Recorded artifact fetches.
    fetches: Arc<RwLock<Vec<String>>>,
    /// Counter for generated task ids.
    task_counter: Arc<RwLock<u32>>,
    clock: Option<Arc<dyn Clock>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(RwLock::new(HashMap::new())),
            status_calls: Arc::new(RwLock::new(Vec::new())),
            submissions: Arc::new(RwLock::new(Vec::new())),
            submit_response: Arc::new(RwLock::new(None)),
            fail_next_submit: Arc::new(RwLock::new(false)),
            artifacts: Arc::new(RwLock::new(HashMap::new())),
            artifacts_unavailable: Arc::new(RwLock::new(false)),
            fetches: Arc::new(RwLock::new(Vec::new())),
            task_counter: Arc::new(RwLock::new(0)),
            clock: None,
        }
    }

    /// Stamp recorded status queries with readings of `clock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the answers for a task's upcoming status queries, in order.
    pub async fn script_status(&self, task_id: &TaskId, answers: Vec<ScriptedStatus>) {
        self.scripts
            .write()
            .await
            .insert(task_id.clone(), answers.into());
    }

    /// Get all recorded status queries.
    pub async fn status_calls(&self) -> Vec<RecordedStatusCall> {
        self.status_calls.read().await.clone()
    }

    /// Clock readings of every status query for one task.
    pub async fn status_calls_for(&self, task_id: &TaskId) -> Vec<Duration> {
        self.status_calls
            .read()
            .await
            .iter()
            .filter(|c| &c.task_id == task_id)
            .map(|c| c.at)
            .collect()
    }

    pub async fn status_call_count(&self, task_id: &TaskId) -> usize {
        self.status_calls_for(task_id).await.len()
    }

    /// Return exactly these descriptors from the next submissions.
    pub async fn set_submit_response(&self, descriptors: Vec<TaskDescriptor>) {
        *self.submit_response.write().await = Some(descriptors);
    }

    /// Make the next submit fail with a connection error.
    pub async fn fail_next_submit(&self) {
        *self.fail_next_submit.write().await = true;
    }

    /// Get all recorded submit calls.
    pub async fn submissions(&self) -> Vec<ConversionRequest> {
        self.submissions.read().await.clone()
    }

    /// Set the bytes served for an artifact.
    pub async fn set_artifact(&self, output_file: &str, bytes: Vec<u8>) {
        self.artifacts
            .write()
            .await
            .insert(output_file.to_string(), bytes);
    }

    /// Make every artifact fetch fail (or succeed again).
    pub async fn set_artifact_unavailable(&self, unavailable: bool) {
        *self.artifacts_unavailable.write().await = unavailable;
    }

    /// Get all recorded artifact fetches.
    pub async fn artifact_fetches(&self) -> Vec<String> {
        self.fetches.read().await.clone()
    }

    async fn generate_descriptors(&self, request: &ConversionRequest) -> Vec<TaskDescriptor> {
        let mut counter = self.task_counter.write().await;
        request
            .files
            .iter()
            .map(|file| {
                *counter += 1;
                let stem = Path::new(&file.name)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.name.clone());
                TaskDescriptor {
                    task_id: TaskId::new(format!("task-{}", counter)),
                    input_file: file.name.clone(),
                    output_file: format!("{}.{}", stem, request.target_format),
                }
            })
            .collect()
    }
}

#[async_trait]
impl ConversionBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(
        &self,
        request: &ConversionRequest,
    ) -> Result<Vec<TaskDescriptor>, BackendError> {
        self.submissions.write().await.push(request.clone());

        {
            let mut fail = self.fail_next_submit.write().await;
            if *fail {
                *fail = false;
                return Err(BackendError::ConnectionFailed(
                    "mock submit failure".to_string(),
                ));
            }
        }

        if let Some(descriptors) = self.submit_response.read().await.clone() {
            return Ok(descriptors);
        }
        Ok(self.generate_descriptors(request).await)
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<StatusReport, BackendError> {
        let at = self.clock.as_ref().map(|c| c.now()).unwrap_or_default();
        self.status_calls.write().await.push(RecordedStatusCall {
            task_id: task_id.clone(),
            at,
        });

        let next = self
            .scripts
            .write()
            .await
            .get_mut(task_id)
            .and_then(|answers| answers.pop_front());

        match next {
            Some(ScriptedStatus::Report(report)) => Ok(report),
            Some(ScriptedStatus::TransportError) => Err(BackendError::ConnectionFailed(
                "mock backend unreachable".to_string(),
            )),
            None => Ok(StatusReport::running()),
        }
    }

    async fn fetch_artifact(&self, output_file: &str) -> Result<Vec<u8>, BackendError> {
        self.fetches.write().await.push(output_file.to_string());

        if *self.artifacts_unavailable.read().await {
            return Err(BackendError::Http(404));
        }

        Ok(self
            .artifacts
            .read()
            .await
            .get(output_file)
            .cloned()
            .unwrap_or_else(|| output_file.as_bytes().to_vec()))
    }
}

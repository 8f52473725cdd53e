//! Types for conversion backend operations.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::selection::SelectedFile;

/// Errors that can occur talking to the conversion backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {0}")]
    Http(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rejected by backend: {0}")]
    Rejected(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_connect() {
            BackendError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            BackendError::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            BackendError::Http(status.as_u16())
        } else {
            BackendError::ApiError(e.to_string())
        }
    }
}

/// Opaque task identifier issued by the backend.
///
/// Accepts either a JSON string or a JSON integer on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Text(s) => TaskId(s),
            Wire::Signed(n) => TaskId(n.to_string()),
            Wire::Unsigned(n) => TaskId(n.to_string()),
        })
    }
}

/// One entry of the `/convert` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub task_id: TaskId,
    pub input_file: String,
    pub output_file: String,
}

/// Body of the `/convert` response.
///
/// A successful submission carries `tasks`; a rejected one carries
/// `status = "error"` and a `message` instead.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub tasks: Option<Vec<TaskDescriptor>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SubmitResponse {
    pub fn into_descriptors(self) -> Result<Vec<TaskDescriptor>, BackendError> {
        match (self.tasks, self.status.as_deref()) {
            (Some(tasks), _) => Ok(tasks),
            (None, Some("error")) => Err(BackendError::Rejected(
                self.message
                    .unwrap_or_else(|| "conversion request rejected".to_string()),
            )),
            (None, _) => Err(BackendError::InvalidResponse(
                "response has no tasks".to_string(),
            )),
        }
    }
}

/// Status value reported by `/task_status/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Running,
    Done,
    Other(String),
}

impl RemoteStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "running" => RemoteStatus::Running,
            "done" => RemoteStatus::Done,
            other => RemoteStatus::Other(other.to_string()),
        }
    }
}

/// Parsed `/task_status/{id}` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: RemoteStatus,
    /// Only meaningful when `status` is `Done`.
    pub success: Option<bool>,
}

impl StatusReport {
    pub fn running() -> Self {
        Self {
            status: RemoteStatus::Running,
            success: None,
        }
    }

    pub fn done(success: bool) -> Self {
        Self {
            status: RemoteStatus::Done,
            success: Some(success),
        }
    }
}

impl<'de> Deserialize<'de> for StatusReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Wire {
            status: String,
            #[serde(default)]
            success: Option<bool>,
        }

        let wire = Wire::deserialize(deserializer)?;
        Ok(StatusReport {
            status: RemoteStatus::parse(&wire.status),
            success: wire.success,
        })
    }
}

/// A single conversion request covering every selected file.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub files: Vec<SelectedFile>,
    pub target_format: String,
    pub quality_level: u32,
}

/// Path of the downloadable artifact, relative to the backend base URL.
pub fn download_path(output_file: &str) -> String {
    format!("/download/{}", urlencoding::encode(output_file))
}

/// Path of the preview artifact, relative to the backend base URL.
pub fn converted_path(output_file: &str) -> String {
    format!("/converted/{}", urlencoding::encode(output_file))
}

/// Trait for conversion backends.
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Submit one request creating one task per file.
    async fn submit(
        &self,
        request: &ConversionRequest,
    ) -> Result<Vec<TaskDescriptor>, BackendError>;

    /// Query the status of a task.
    async fn task_status(&self, task_id: &TaskId) -> Result<StatusReport, BackendError>;

    /// Fetch the bytes of a finished artifact.
    async fn fetch_artifact(&self, output_file: &str) -> Result<Vec<u8>, BackendError>;

    /// Absolute URL of the preview for a finished artifact.
    fn preview_url(&self, output_file: &str) -> String {
        converted_path(output_file)
    }
}

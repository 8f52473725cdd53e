//! Task lifecycle: one poller per submitted task, driven by the orchestrator.
//!
//! - **Submission**: one request per selection, handled by `SubmissionDispatcher`
//! - **Polling**: concurrent, one independent loop per task
//! - **Side effects**: fired once per output file on success

mod config;
mod orchestrator;
mod runner;
mod types;

pub use config::PollerConfig;
pub use orchestrator::ConversionOrchestrator;
pub use runner::{decide, PollDecision, TaskPoller};
pub use types::{OrchestratorStatus, Task, TaskState};

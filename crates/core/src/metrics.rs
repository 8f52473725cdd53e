//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Submissions (requests sent, by result)
//! - Pollers (status queries, terminal transitions)
//! - Side effects (downloads triggered)

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

// =============================================================================
// Submission Metrics
// =============================================================================

/// Conversion requests sent, by result.
pub static SUBMISSIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "convertino_submissions_total",
            "Total conversion requests sent",
        ),
        &["result"], // "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Poller Metrics
// =============================================================================

/// Status queries issued, by outcome.
pub static STATUS_POLLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("convertino_status_polls_total", "Total task status queries"),
        &["result"], // "running", "done", "other", "transport_error"
    )
    .unwrap()
});

/// Tasks that reached a terminal state.
pub static TASKS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "convertino_tasks_finished_total",
            "Total tasks that reached a terminal state",
        ),
        &["state"], // "succeeded", "failed"
    )
    .unwrap()
});

// =============================================================================
// Side Effect Metrics
// =============================================================================

/// Artifact downloads started.
pub static DOWNLOADS_TRIGGERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "convertino_downloads_triggered_total",
        "Total artifact downloads started",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SUBMISSIONS.clone()),
        Box::new(STATUS_POLLS.clone()),
        Box::new(TASKS_FINISHED.clone()),
        Box::new(DOWNLOADS_TRIGGERED.clone()),
    ]
}

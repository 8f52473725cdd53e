//! Orchestrator lifecycle integration tests.
//!
//! These tests drive complete task lifecycles through the orchestrator:
//! submit -> running (polled) -> succeeded | failed
//!
//! Time is paused, so the progress and retry intervals elapse instantly while
//! their ordering is preserved.

use std::sync::Arc;
use std::time::Duration;

use convertino_core::{
    testing::{fixtures, MockBackend, MockDownloader, PresenterEvent, RecordingPresenter, ScriptedStatus},
    ConversionOrchestrator, PollerConfig, PreviewKind, SideEffectDispatcher, StatusReport,
    TaskId, TaskState, TokioClock,
};

/// Test helper wiring an orchestrator to mocks.
struct TestHarness {
    backend: Arc<MockBackend>,
    presenter: Arc<RecordingPresenter>,
    downloader: Arc<MockDownloader>,
    orchestrator: ConversionOrchestrator,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(PollerConfig::default())
    }

    fn with_config(config: PollerConfig) -> Self {
        let clock = Arc::new(TokioClock::new());
        let backend = Arc::new(MockBackend::new().with_clock(clock.clone()));
        let presenter = Arc::new(RecordingPresenter::new());
        let downloader = Arc::new(MockDownloader::new());
        let effects = Arc::new(
            SideEffectDispatcher::new(backend.clone(), presenter.clone())
                .with_downloader(downloader.clone()),
        );
        let orchestrator =
            ConversionOrchestrator::new(config, backend.clone(), effects, presenter.clone())
                .with_clock(clock);

        Self {
            backend,
            presenter,
            downloader,
            orchestrator,
        }
    }

    async fn script(&self, task_id: &str, answers: Vec<ScriptedStatus>) {
        self.backend.script_status(&TaskId::new(task_id), answers).await;
    }
}

fn running() -> ScriptedStatus {
    ScriptedStatus::Report(StatusReport::running())
}

fn done(success: bool) -> ScriptedStatus {
    ScriptedStatus::Report(StatusReport::done(success))
}

fn gaps(calls: &[Duration]) -> Vec<Duration> {
    calls.windows(2).map(|w| w[1] - w[0]).collect()
}

#[tokio::test(start_paused = true)]
async fn test_single_video_converts_and_downloads() {
    let h = TestHarness::new();
    h.backend
        .set_submit_response(vec![fixtures::descriptor("t1", "clip.mov", "clip.mp4")])
        .await;
    h.script("t1", vec![running(), running(), done(true)]).await;

    let selection = fixtures::selection(&["clip.mov"]);
    let tasks = h.orchestrator.submit(&selection, "mp4", 80).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].state, TaskState::Running);

    let status = h.orchestrator.wait_all().await;
    assert_eq!(status.succeeded, 1);

    // One request carrying the selection, format and quality.
    let submissions = h.backend.submissions().await;
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].files[0].name, "clip.mov");
    assert_eq!(submissions[0].target_format, "mp4");
    assert_eq!(submissions[0].quality_level, 80);

    // Three queries, each at least the progress interval after the previous.
    let calls = h.backend.status_calls_for(&TaskId::new("t1")).await;
    assert_eq!(calls.len(), 3);
    assert!(gaps(&calls).iter().all(|g| *g >= Duration::from_secs(2)));

    let events = h.presenter.events_for(&TaskId::new("t1"));
    let progress: Vec<_> = events
        .iter()
        .map(|e| match e {
            PresenterEvent::Created { .. } => (TaskState::Running, 0),
            PresenterEvent::Updated {
                state,
                progress_pct,
                ..
            } => (*state, *progress_pct),
            other => panic!("unexpected event {:?}", other),
        })
        .collect();
    assert_eq!(
        progress,
        vec![
            (TaskState::Running, 0),
            (TaskState::Running, 50),
            (TaskState::Running, 50),
            (TaskState::Succeeded, 100),
        ]
    );

    let previews = h.presenter.previews();
    assert_eq!(previews.len(), 1);
    assert_eq!(previews[0].kind, PreviewKind::Video);
    assert_eq!(h.downloader.triggered(), vec!["clip.mp4".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_tasks_are_polled_independently() {
    let h = TestHarness::new();
    h.backend
        .set_submit_response(vec![
            fixtures::descriptor("fast", "a.png", "a.jpg"),
            fixtures::descriptor("slow", "b.png", "b.jpg"),
            fixtures::descriptor("broken", "c.png", "c.jpg"),
        ])
        .await;
    h.script("fast", vec![done(true)]).await;
    h.script("slow", vec![running(), running(), running(), running(), done(true)])
        .await;
    h.script("broken", vec![running(), done(false)]).await;

    let selection = fixtures::selection(&["a.png", "b.png", "c.png"]);
    let tasks = h.orchestrator.submit(&selection, "jpg", 90).await.unwrap();
    assert_eq!(tasks.len(), 3);

    let status = h.orchestrator.wait_all().await;
    assert_eq!(status.total, 3);
    assert_eq!(status.succeeded, 2);
    assert_eq!(status.failed, 1);

    let fast = h.backend.status_calls_for(&TaskId::new("fast")).await;
    let slow = h.backend.status_calls_for(&TaskId::new("slow")).await;
    assert_eq!(fast.len(), 1);
    assert_eq!(slow.len(), 5);
    // The fast task finished before the slow one was first re-queried.
    assert!(fast[0] < slow[1]);

    let tasks = h.orchestrator.tasks().await;
    let states: Vec<_> = tasks.iter().map(|t| t.state).collect();
    assert_eq!(
        states,
        vec![TaskState::Succeeded, TaskState::Succeeded, TaskState::Failed]
    );

    let mut triggered = h.downloader.triggered();
    triggered.sort();
    assert_eq!(triggered, vec!["a.jpg".to_string(), "b.jpg".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_conversion_has_no_side_effects() {
    let h = TestHarness::new();
    h.backend
        .set_submit_response(vec![fixtures::descriptor("t1", "song.wav", "song.mp3")])
        .await;
    h.script("t1", vec![running(), done(false)]).await;

    h.orchestrator
        .submit(&fixtures::selection(&["song.wav"]), "mp3", 80)
        .await
        .unwrap();
    let status = h.orchestrator.wait_all().await;

    assert_eq!(status.failed, 1);
    assert!(h.presenter.previews().is_empty());
    assert!(h.downloader.triggered().is_empty());
    assert!(!h.orchestrator.effects().ledger().contains("song.mp3"));
}

#[tokio::test(start_paused = true)]
async fn test_no_queries_after_terminal_state() {
    let h = TestHarness::new();
    h.backend
        .set_submit_response(vec![
            fixtures::descriptor("ok", "a.mov", "a.mp4"),
            fixtures::descriptor("bad", "b.mov", "b.mp4"),
        ])
        .await;
    h.script("ok", vec![running(), done(true)]).await;
    h.script("bad", vec![done(false)]).await;

    h.orchestrator
        .submit(&fixtures::selection(&["a.mov", "b.mov"]), "mp4", 80)
        .await
        .unwrap();
    h.orchestrator.wait_all().await;
    let total = h.backend.status_calls().await.len();

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.backend.status_calls().await.len(), total);
    assert_eq!(total, 3);
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_retries_after_backoff() {
    let h = TestHarness::new();
    h.backend
        .set_submit_response(vec![fixtures::descriptor("t1", "clip.mov", "clip.mp4")])
        .await;
    h.script(
        "t1",
        vec![
            ScriptedStatus::TransportError,
            ScriptedStatus::TransportError,
            running(),
            done(true),
        ],
    )
    .await;

    h.orchestrator
        .submit(&fixtures::selection(&["clip.mov"]), "mp4", 80)
        .await
        .unwrap();
    let status = h.orchestrator.wait_all().await;
    assert_eq!(status.succeeded, 1);

    let calls = h.backend.status_calls_for(&TaskId::new("t1")).await;
    let gaps = gaps(&calls);
    assert!(gaps[0] >= Duration::from_secs(4));
    assert!(gaps[1] >= Duration::from_secs(4));
    assert!(gaps[2] >= Duration::from_secs(2));

    // Failed queries leave the displayed state untouched.
    let updates = h
        .presenter
        .events_for(&TaskId::new("t1"))
        .into_iter()
        .filter(|e| matches!(e, PresenterEvent::Updated { .. }))
        .count();
    assert_eq!(updates, 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_ceiling_fails_unreachable_task() {
    let h = TestHarness::with_config(PollerConfig {
        max_transport_retries: Some(2),
        ..Default::default()
    });
    h.backend
        .set_submit_response(vec![fixtures::descriptor("t1", "clip.mov", "clip.mp4")])
        .await;
    h.script("t1", vec![ScriptedStatus::TransportError; 10]).await;

    h.orchestrator
        .submit(&fixtures::selection(&["clip.mov"]), "mp4", 80)
        .await
        .unwrap();
    let status = h.orchestrator.wait_all().await;

    assert_eq!(status.failed, 1);
    assert_eq!(h.backend.status_call_count(&TaskId::new("t1")).await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_shared_output_name_downloads_once() {
    let h = TestHarness::new();
    h.backend
        .set_submit_response(vec![
            fixtures::descriptor("t1", "photo.png", "photo.jpg"),
            fixtures::descriptor("t2", "photo.bmp", "photo.jpg"),
        ])
        .await;
    h.script("t1", vec![done(true)]).await;
    h.script("t2", vec![running(), done(true)]).await;

    h.orchestrator
        .submit(&fixtures::selection(&["photo.png", "photo.bmp"]), "jpg", 80)
        .await
        .unwrap();
    let status = h.orchestrator.wait_all().await;

    assert_eq!(status.succeeded, 2);
    assert_eq!(h.downloader.triggered(), vec!["photo.jpg".to_string()]);
    assert_eq!(h.presenter.previews().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resubmission_adds_tasks() {
    let h = TestHarness::new();

    h.orchestrator
        .submit(&fixtures::selection(&["a.png"]), "webp", 80)
        .await
        .unwrap();
    h.script("task-1", vec![done(true)]).await;
    h.orchestrator
        .submit(&fixtures::selection(&["b.png"]), "webp", 40)
        .await
        .unwrap();
    h.script("task-2", vec![done(true)]).await;

    let status = h.orchestrator.wait_all().await;
    assert_eq!(status.total, 2);
    assert_eq!(status.succeeded, 2);
    assert_eq!(h.backend.submissions().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_submission_creates_no_tasks() {
    let h = TestHarness::new();
    h.backend.fail_next_submit().await;

    let err = h
        .orchestrator
        .submit(&fixtures::selection(&["clip.mov"]), "mp4", 80)
        .await
        .unwrap_err();

    assert!(!err.is_validation());
    assert!(h.orchestrator.tasks().await.is_empty());
    assert!(matches!(
        h.presenter.events().as_slice(),
        [PresenterEvent::SubmissionFailed(_)]
    ));
}

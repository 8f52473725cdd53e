//! Common test utilities for end-to-end CLI tests.
//!
//! Provides an in-process fake conversion service on a random local port,
//! plus a helper that runs the `convertino` binary against it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Inputs whose name starts with this prefix fail to convert.
pub const BROKEN_PREFIX: &str = "broken";

/// A recorded `/convert` request.
#[derive(Debug, Clone, Default)]
pub struct RecordedConvert {
    pub files: Vec<String>,
    pub target_format: String,
    pub quality_level: String,
}

#[derive(Debug)]
struct FakeTask {
    output_file: String,
    polls: u32,
    succeeds: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    next_id: u64,
    tasks: HashMap<String, FakeTask>,
    converts: Vec<RecordedConvert>,
    status_queries: Vec<String>,
    downloads: Vec<String>,
}

type Shared = Arc<Mutex<FakeState>>;

/// Fake conversion service.
///
/// Every task reports `running` once, then `done`. Tasks are numbered from 1
/// and their ids are sent as JSON integers.
pub struct FakeBackend {
    pub addr: SocketAddr,
    state: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new()
            .route("/convert", post(convert))
            .route("/task_status/{id}", get(task_status))
            .route("/download/{name}", get(download))
            .route("/converted/{name}", get(converted))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn converts(&self) -> Vec<RecordedConvert> {
        self.state.lock().unwrap().converts.clone()
    }

    pub fn status_queries(&self) -> Vec<String> {
        self.state.lock().unwrap().status_queries.clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.state.lock().unwrap().downloads.clone()
    }
}

async fn convert(State(state): State<Shared>, mut multipart: Multipart) -> impl IntoResponse {
    let mut request = RecordedConvert::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name().unwrap_or_default().to_string().as_str() {
            "files" => {
                let name = field.file_name().unwrap_or_default().to_string();
                let _ = field.bytes().await;
                request.files.push(name);
            }
            "target_format" => request.target_format = field.text().await.unwrap_or_default(),
            "quality_level" => request.quality_level = field.text().await.unwrap_or_default(),
            _ => {}
        }
    }

    if request.target_format.is_empty() {
        return Json(json!({ "status": "error", "message": "missing target format" }));
    }

    let mut state = state.lock().unwrap();
    let mut tasks = Vec::new();
    for input in &request.files {
        state.next_id += 1;
        let id = state.next_id;
        let stem = Path::new(input)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output_file = format!("{}.{}", stem, request.target_format);
        state.tasks.insert(
            id.to_string(),
            FakeTask {
                output_file: output_file.clone(),
                polls: 0,
                succeeds: !input.starts_with(BROKEN_PREFIX),
            },
        );
        tasks.push(json!({ "task_id": id, "input_file": input, "output_file": output_file }));
    }
    state.converts.push(request);

    Json(json!({ "tasks": tasks }))
}

async fn task_status(State(state): State<Shared>, UrlPath(id): UrlPath<String>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.status_queries.push(id.clone());
    match state.tasks.get_mut(&id) {
        Some(task) => {
            task.polls += 1;
            if task.polls == 1 {
                Json(json!({ "status": "running" }))
            } else {
                Json(json!({ "status": "done", "success": task.succeeds }))
            }
        }
        None => Json(json!({ "status": "unknown" })),
    }
}

async fn download(State(state): State<Shared>, UrlPath(name): UrlPath<String>) -> impl IntoResponse {
    let mut state = state.lock().unwrap();
    state.downloads.push(name.clone());
    if state.tasks.values().any(|t| t.output_file == name) {
        (StatusCode::OK, format!("converted {}", name).into_bytes())
    } else {
        (StatusCode::NOT_FOUND, Vec::new())
    }
}

async fn converted(UrlPath(name): UrlPath<String>) -> impl IntoResponse {
    (StatusCode::OK, format!("preview {}", name).into_bytes())
}

/// A scratch directory with input files and a config pointing at a backend.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new(backend_url: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = format!(
            r#"
[backend]
url = "{}"
request_timeout_ms = 5000

[poller]
progress_interval_ms = 20
retry_interval_ms = 40

[output]
dir = "{}"
"#,
            backend_url,
            dir.path().join("out").display()
        );
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        Self { dir }
    }

    pub fn input(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, format!("source {}", name)).unwrap();
        path
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.dir.path().join("out").join(name)
    }

    /// Run the binary with this workspace's config.
    pub async fn run(&self, args: &[&str], files: &[PathBuf]) -> Output {
        tokio::process::Command::new(env!("CARGO_BIN_EXE_convertino"))
            .arg("--config")
            .arg(self.dir.path().join("config.toml"))
            .args(args)
            .args(files)
            .env_remove("CONVERTINO_CONFIG")
            .env("RUST_LOG", "info")
            .output()
            .await
            .expect("Failed to run convertino")
    }
}

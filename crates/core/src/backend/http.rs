//! HTTP conversion backend implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::BackendConfig;

use super::{
    converted_path, download_path, BackendError, ConversionBackend, ConversionRequest,
    StatusReport, SubmitResponse, TaskDescriptor, TaskId,
};

/// Conversion backend reached over HTTP.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new HTTP backend client.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::ApiError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Reject non-2xx responses.
    fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Http(status.as_u16()));
        }
        Ok(response)
    }

    /// Read a JSON body, reporting malformed bodies as invalid responses.
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            BackendError::InvalidResponse(format!(
                "{} (body: {})",
                e,
                body.chars().take(100).collect::<String>()
            ))
        })
    }

    /// Build the multipart body: one `files` part per file plus the two scalar fields.
    async fn build_form(request: &ConversionRequest) -> Result<multipart::Form, BackendError> {
        let mut form = multipart::Form::new();

        for file in &request.files {
            let data = tokio::fs::read(&file.path).await?;
            let part = multipart::Part::bytes(data)
                .file_name(file.name.clone())
                .mime_str(&file.media_type)
                .map_err(|e| {
                    BackendError::ApiError(format!(
                        "invalid media type '{}' for {}: {}",
                        file.media_type, file.name, e
                    ))
                })?;
            form = form.part("files", part);
        }

        Ok(form
            .text("target_format", request.target_format.clone())
            .text("quality_level", request.quality_level.to_string()))
    }
}

#[async_trait]
impl ConversionBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn submit(
        &self,
        request: &ConversionRequest,
    ) -> Result<Vec<TaskDescriptor>, BackendError> {
        let form = Self::build_form(request).await?;
        let response = self
            .client
            .post(self.url("/convert"))
            .multipart(form)
            .send()
            .await?;

        let response: SubmitResponse = Self::read_json(Self::check_status(response)?).await?;
        response.into_descriptors()
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<StatusReport, BackendError> {
        let url = self.url(&format!(
            "/task_status/{}",
            urlencoding::encode(task_id.as_str())
        ));
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            return Self::read_json(response).await;
        }

        // Error responses still decide the task when they carry a status body.
        let body = response.text().await?;
        match serde_json::from_str::<StatusReport>(&body) {
            Ok(report) => {
                debug!("HTTP {} with status body {:?}", status.as_u16(), report);
                Ok(report)
            }
            Err(_) => Err(BackendError::Http(status.as_u16())),
        }
    }

    async fn fetch_artifact(&self, output_file: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .client
            .get(self.url(&download_path(output_file)))
            .send()
            .await?;
        let bytes = Self::check_status(response)?.bytes().await?;
        Ok(bytes.to_vec())
    }

    fn preview_url(&self, output_file: &str) -> String {
        self.url(&converted_path(output_file))
    }
}

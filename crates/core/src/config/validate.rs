use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Backend URL is an absolute http(s) URL
/// - Poll intervals are non-zero
/// - The failure backoff is not shorter than the steady-state interval
/// - Hardening knobs, when set, are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(&config.backend.url).map_err(|e| {
        ConfigError::ValidationError(format!(
            "backend.url '{}' is not a valid URL: {}",
            config.backend.url, e
        ))
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::ValidationError(format!(
            "backend.url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.backend.request_timeout_ms == Some(0) {
        return Err(ConfigError::ValidationError(
            "backend.request_timeout_ms cannot be 0".to_string(),
        ));
    }

    let poller = &config.poller;
    if poller.progress_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "poller.progress_interval_ms cannot be 0".to_string(),
        ));
    }
    if poller.retry_interval_ms < poller.progress_interval_ms {
        return Err(ConfigError::ValidationError(format!(
            "poller.retry_interval_ms ({}) must not be shorter than poller.progress_interval_ms ({})",
            poller.retry_interval_ms, poller.progress_interval_ms
        )));
    }
    if poller.max_transport_retries == Some(0) {
        return Err(ConfigError::ValidationError(
            "poller.max_transport_retries cannot be 0".to_string(),
        ));
    }

    Ok(())
}

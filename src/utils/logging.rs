//! Logging utilities
//!
//! Shared logging configuration and helper functions

use crate::config::LoggingConfig;
use crate::services::transport::{HttpRequest, RequestBody};
use crate::utils::error::{helpers::config_error, ClientResult};
use tracing::info;

/// Set to true to include full request payloads (prompts, texts) in debug logs
/// Default is false to reduce log verbosity
pub const VERBOSE_REQUEST_LOGGING: bool = false;

/// Truncate a string with a note about original length
pub fn truncate_content(s: &str, max_len: usize) -> String {
    let total = s.chars().count();
    if total > max_len {
        let kept: String = s.chars().take(max_len).collect();
        format!("{}... ({} chars truncated)", kept, total - max_len)
    } else {
        s.to_string()
    }
}

/// Truncate every string in a JSON payload, keeping its structure
fn filter_json_value(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => {
            serde_json::Value::String(truncate_content(s, 200))
        },
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(filter_json_value).collect())
        },
        serde_json::Value::Object(map) => {
            let filtered = map.iter()
                .map(|(key, value)| (key.clone(), filter_json_value(value)))
                .collect();
            serde_json::Value::Object(filtered)
        },
        other => other.clone(),
    }
}

/// Create a filtered summary of an outgoing request for logging
/// Keeps payload structure but truncates long texts and hides binary content
pub fn create_request_log_summary(request: &HttpRequest) -> serde_json::Value {
    let body = match &request.body {
        RequestBody::Json(value) if VERBOSE_REQUEST_LOGGING => value.clone(),
        RequestBody::Json(value) => filter_json_value(value),
        RequestBody::Binary(bytes) => serde_json::json!(format!("[{} bytes]", bytes.len())),
    };

    serde_json::json!({
        "method": request.method.as_str(),
        "url": request.url,
        "content_type": request.content_type(),
        "stream": request.stream,
        "body": body,
    })
}

/// Install a global `tracing` subscriber
///
/// Text output for development, JSON for production. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> ClientResult<()> {
    let result = if config.is_json() {
        // JSON format logs (production environment)
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(config.level.as_str())
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        // Human readable format (development environment)
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(config.level.as_str())
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    result.map_err(|e| config_error(format!("Failed to set tracing subscriber: {}", e)))?;

    info!("Logging system initialized");
    Ok(())
}

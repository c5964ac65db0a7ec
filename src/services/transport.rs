//! HTTP transport service
//!
//! Encapsulates HTTP communication with the Workers AI API: authentication,
//! body encoding, connection retries, timeouts, streaming and cancellation.

use crate::config::ClientConfig;
use crate::utils::error::{ClientError, ClientResult, ErrorContext, TransportError};
use crate::utils::logging::create_request_log_summary;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

/// A boxed stream of fallible items
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = ClientResult<T>> + Send + 'a>>;

/// Raw response body chunks
pub type ByteStream = BoxStream<'static, Bytes>;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Longest server error body quoted in an error reason
const MAX_REASON_LEN: usize = 512;

/// Outgoing request body
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Structured payload, serialized when the content type is JSON
    Json(serde_json::Value),
    /// Opaque bytes (images, audio)
    Binary(Bytes),
}

/// One outgoing HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Caller headers, merged on top of the transport defaults
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    /// Expose the response body as a chunk stream instead of buffering it
    pub stream: bool,
}

impl HttpRequest {
    /// `POST` with a JSON payload
    pub fn json<T: Serialize>(url: impl Into<String>, payload: &T) -> ClientResult<Self> {
        let value = serde_json::to_value(payload).validation_context("Failed to serialize request payload")?;
        Ok(Self {
            method: Method::POST,
            url: url.into(),
            headers: vec![(CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string())],
            body: RequestBody::Json(value),
            stream: false,
        })
    }

    /// `POST` with a binary payload
    pub fn binary(url: impl Into<String>, bytes: impl Into<Bytes>, content_type: &str) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: vec![(CONTENT_TYPE.to_string(), content_type.to_string())],
            body: RequestBody::Binary(bytes.into()),
            stream: false,
        }
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Effective content type: the last `Content-Type` header supplied
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()))
            .map(|(_, value)| value.as_str())
    }

    /// Encode the body according to the effective content type
    pub fn encode_body(&self) -> ClientResult<Bytes> {
        let is_json = self.content_type().map(is_json_content_type).unwrap_or(false);
        match (&self.body, is_json) {
            (RequestBody::Json(value), true) => {
                let encoded = serde_json::to_vec(value).validation_context("Failed to serialize request payload")?;
                Ok(Bytes::from(encoded))
            }
            (RequestBody::Binary(bytes), _) => Ok(bytes.clone()),
            (RequestBody::Json(_), false) => Err(ClientError::Validation(format!(
                "Structured payload requires Content-Type {}, got {}",
                JSON_CONTENT_TYPE,
                self.content_type().unwrap_or("none")
            ))),
        }
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|mime| mime.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE))
        .unwrap_or(false)
}

/// Build the header map for one call: caller headers plus bearer authentication
///
/// A caller-supplied `Authorization` header is ignored.
pub fn build_headers(api_key: &str, extra: &[(String, String)]) -> ClientResult<HeaderMap> {
    let mut headers = HeaderMap::new();

    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes()).validation_context("Invalid header name")?;
        if name == AUTHORIZATION {
            continue;
        }
        let value = HeaderValue::from_str(value).validation_context("Invalid header value")?;
        headers.insert(name, value);
    }

    let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key)).config_context("Invalid API key")?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    Ok(headers)
}

/// Response body, buffered or streamed
pub enum ResponseBody {
    Buffered(Bytes),
    Streaming(ByteStream),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Buffered(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
            ResponseBody::Streaming(_) => f.write_str("Streaming"),
        }
    }
}

/// Raw HTTP response as returned by a [`Transport`]
#[derive(Debug)]
pub struct RawResponse {
    status: u16,
    headers: HeaderMap,
    body: ResponseBody,
}

impl RawResponse {
    pub fn new(status: u16, headers: HeaderMap, body: ResponseBody) -> Self {
        Self { status, headers, body }
    }

    pub fn buffered(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self::new(status, headers, ResponseBody::Buffered(body.into()))
    }

    pub fn streaming(status: u16, headers: HeaderMap, stream: ByteStream) -> Self {
        Self::new(status, headers, ResponseBody::Streaming(stream))
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.body, ResponseBody::Streaming(_))
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Buffered body, if the response was not streamed
    pub fn body_bytes(&self) -> Option<&Bytes> {
        match &self.body {
            ResponseBody::Buffered(bytes) => Some(bytes),
            ResponseBody::Streaming(_) => None,
        }
    }

    pub fn into_parts(self) -> (u16, HeaderMap, ResponseBody) {
        (self.status, self.headers, self.body)
    }

    /// Buffered body; a streamed body cannot be read this way
    pub fn into_bytes(self) -> ClientResult<Bytes> {
        match self.body {
            ResponseBody::Buffered(bytes) => Ok(bytes),
            ResponseBody::Streaming(_) => Err(ClientError::Decoding(
                "Expected a buffered response body but the response is streaming".to_string(),
            )),
        }
    }

    /// Body as a chunk stream; a buffered body becomes a single chunk
    pub fn into_stream(self) -> ByteStream {
        match self.body {
            ResponseBody::Streaming(stream) => stream,
            ResponseBody::Buffered(bytes) => Box::pin(futures::stream::once(async move { Ok::<_, ClientError>(bytes) })),
        }
    }

    /// Turn a non-2xx status into a typed [`TransportError`]
    pub fn error_for_status(self) -> ClientResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let reason = self.error_reason();
        Err(TransportError::from_status(self.status, reason).into())
    }

    /// Server-provided reason for a failed response
    fn error_reason(&self) -> String {
        if let Some(bytes) = self.body_bytes() {
            if let Ok(json) = serde_json::from_slice::<serde_json::Value>(bytes) {
                let message = json["errors"]
                    .as_array()
                    .and_then(|errors| errors.first())
                    .and_then(|error| error["message"].as_str())
                    .or_else(|| json["error"].as_str());
                if let Some(message) = message {
                    return message.to_string();
                }
            }

            let text = String::from_utf8_lossy(bytes);
            let text = text.trim();
            if !text.is_empty() {
                return text.chars().take(MAX_REASON_LEN).collect();
            }
        }

        StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unknown error")
            .to_string()
    }
}

/// Transport abstraction
///
/// Issues one HTTP request and returns the response with its status untouched.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest, cancel: &CancellationToken) -> ClientResult<RawResponse>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    api_key: String,
    retries: u32,
    timeout_seconds: u64,
}

impl HttpTransport {
    /// Create a new transport instance
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .user_agent(concat!("workers-ai/", env!("CARGO_PKG_VERSION")))
            .build()
            .config_context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: config.api_key().to_string(),
            retries: config.retries(),
            timeout_seconds: config.timeout_seconds(),
        })
    }

    /// Send with connection-level retries
    async fn execute(&self, request: &HttpRequest) -> ClientResult<RawResponse> {
        let headers = build_headers(&self.api_key, &request.headers)?;
        let body = request.encode_body()?;
        let max_attempts = self.retries.saturating_add(1);

        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            let result = self
                .client
                .request(request.method.clone(), &request.url)
                .headers(headers.clone())
                .body(body.clone())
                .send()
                .await;

            match result {
                Ok(response) => break response,
                Err(e) if e.is_timeout() => {
                    return Err(TransportError::Timeout(self.timeout_seconds).into());
                }
                Err(e) if e.is_connect() && attempt < max_attempts => {
                    warn!("Connection failed, retrying (attempt {}/{}): {}", attempt, max_attempts, e);
                }
                Err(e) => {
                    return Err(TransportError::Connection {
                        attempts: attempt,
                        reason: e.to_string(),
                    }
                    .into());
                }
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        debug!("Response status: {} (attempt {})", status, attempt);

        // Failed responses are always buffered so the reason reaches the error
        if request.stream && status.is_success() {
            let timeout_seconds = self.timeout_seconds;
            let stream = response
                .bytes_stream()
                .map(move |chunk| chunk.map_err(|e| body_error(e, timeout_seconds)));
            return Ok(RawResponse::streaming(status.as_u16(), headers, Box::pin(stream)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| body_error(e, self.timeout_seconds))?;
        Ok(RawResponse::buffered(status.as_u16(), headers, bytes))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest, cancel: &CancellationToken) -> ClientResult<RawResponse> {
        let span = info_span!(
            "workers_ai_request",
            request_id = %Uuid::new_v4(),
            method = %request.method,
            url = %request.url,
        );

        async move {
            debug!("Sending request: {}", create_request_log_summary(&request));

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Request cancelled before a response arrived");
                    return Err(TransportError::Cancelled.into());
                }
                response = self.execute(&request) => response?,
            };

            if !response.is_streaming() {
                return Ok(response);
            }

            // Cancelling mid-stream ends the chunk sequence and drops the connection
            let (status, headers, body) = response.into_parts();
            let stream = match body {
                ResponseBody::Streaming(stream) => stream,
                ResponseBody::Buffered(bytes) => return Ok(RawResponse::buffered(status, headers, bytes)),
            };
            let cancel = cancel.clone();
            let stream = stream.take_until(async move { cancel.cancelled().await });
            Ok(RawResponse::streaming(status, headers, Box::pin(stream)))
        }
        .instrument(span)
        .await
    }
}

fn body_error(e: reqwest::Error, timeout_seconds: u64) -> ClientError {
    if e.is_timeout() {
        TransportError::Timeout(timeout_seconds).into()
    } else {
        TransportError::Connection {
            attempts: 1,
            reason: format!("Failed to read response body: {}", e),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_cannot_be_overridden() {
        let extra = vec![
            ("Authorization".to_string(), "Bearer evil".to_string()),
            ("X-Trace".to_string(), "abc".to_string()),
        ];
        let headers = build_headers("real-key", &extra).unwrap();

        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer real-key");
        assert_eq!(headers.get("x-trace").unwrap(), "abc");
    }

    #[test]
    fn test_json_body_encoding() {
        let request = HttpRequest::json("https://example.com/m", &serde_json::json!({"text": "hi"})).unwrap();
        assert_eq!(request.content_type(), Some("application/json"));
        assert_eq!(request.encode_body().unwrap(), Bytes::from_static(br#"{"text":"hi"}"#));
    }

    #[test]
    fn test_binary_body_passthrough() {
        let request = HttpRequest::binary("https://example.com/m", vec![1u8, 2, 3], "image/*");
        assert_eq!(request.encode_body().unwrap(), Bytes::from_static(&[1, 2, 3]));
    }

    #[test]
    fn test_json_body_requires_json_content_type() {
        let request = HttpRequest::json("https://example.com/m", &serde_json::json!({"a": 1}))
            .unwrap()
            .with_header("Content-Type", "text/plain");
        assert!(matches!(request.encode_body(), Err(ClientError::Validation(_))));
    }

    #[test]
    fn test_error_reason_prefers_api_errors() {
        let body = r#"{"success":false,"errors":[{"code":10000,"message":"Authentication error"}],"messages":[]}"#;
        let response = RawResponse::buffered(401, HeaderMap::new(), body);
        let err = response.error_for_status().unwrap_err();

        match err {
            ClientError::Transport(TransportError::Authentication { reason }) => {
                assert_eq!(reason, "Authentication error");
            }
            other => panic!("Expected authentication error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_reason_falls_back_to_canonical_phrase() {
        let response = RawResponse::buffered(503, HeaderMap::new(), Bytes::new());
        let err = response.error_for_status().unwrap_err();
        assert!(err.to_string().contains("Service Unavailable"));
    }

    #[test]
    fn test_into_bytes_rejects_streaming_body() {
        let stream: ByteStream = Box::pin(futures::stream::empty::<ClientResult<Bytes>>());
        let response = RawResponse::streaming(200, HeaderMap::new(), stream);
        assert!(matches!(response.into_bytes(), Err(ClientError::Decoding(_))));
    }
}

//! Error handling module
//!
//! Defines error types and handling logic used across the SDK

use thiserror::Error;

/// SDK error types
#[derive(Error, Debug)]
pub enum ClientError {
    /// Missing or invalid client configuration, raised at construction only
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Request violated a capability constraint before anything was sent
    #[error("Request validation failed: {0}")]
    Validation(String),

    /// Network failure or non-success HTTP status
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Response body does not have the expected shape
    #[error("Response decoding failed: {0}")]
    Decoding(String),
}

/// Transport-level failures, classed by HTTP status where one exists
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// 400
    #[error("Bad request: {reason}")]
    BadRequest { reason: String },

    /// 401
    #[error("Authentication failed: {reason}")]
    Authentication { reason: String },

    /// 403
    #[error("Permission denied: {reason}")]
    Permission { reason: String },

    /// 404
    #[error("Resource not found: {reason}")]
    NotFound { reason: String },

    /// 429
    #[error("Rate limit exceeded: {reason}")]
    RateLimit { reason: String },

    /// 5xx
    #[error("Server error {status}: {reason}")]
    Server { status: u16, reason: String },

    /// Any other non-2xx status
    #[error("Unexpected HTTP status {status}: {reason}")]
    Status { status: u16, reason: String },

    /// Connection could not be established within the retry budget
    #[error("Connection failed after {attempts} attempt(s): {reason}")]
    Connection { attempts: u32, reason: String },

    /// Request timed out
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,
}

impl TransportError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match status {
            400 => TransportError::BadRequest { reason },
            401 => TransportError::Authentication { reason },
            403 => TransportError::Permission { reason },
            404 => TransportError::NotFound { reason },
            429 => TransportError::RateLimit { reason },
            500..=599 => TransportError::Server { status, reason },
            _ => TransportError::Status { status, reason },
        }
    }

    /// HTTP status code, if the failure came from one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::BadRequest { .. } => Some(400),
            TransportError::Authentication { .. } => Some(401),
            TransportError::Permission { .. } => Some(403),
            TransportError::NotFound { .. } => Some(404),
            TransportError::RateLimit { .. } => Some(429),
            TransportError::Server { status, .. } | TransportError::Status { status, .. } => Some(*status),
            TransportError::Connection { .. }
            | TransportError::Timeout(_)
            | TransportError::Cancelled => None,
        }
    }

    /// Server-provided reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            TransportError::BadRequest { reason }
            | TransportError::Authentication { reason }
            | TransportError::Permission { reason }
            | TransportError::NotFound { reason }
            | TransportError::RateLimit { reason }
            | TransportError::Server { reason, .. }
            | TransportError::Status { reason, .. }
            | TransportError::Connection { reason, .. } => Some(reason),
            TransportError::Timeout(_) | TransportError::Cancelled => None,
        }
    }

    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            TransportError::BadRequest { .. } => "invalid_request_error",
            TransportError::Authentication { .. } => "authentication_error",
            TransportError::Permission { .. } => "permission_error",
            TransportError::NotFound { .. } => "not_found_error",
            TransportError::RateLimit { .. } => "rate_limit_error",
            TransportError::Server { .. } => "server_error",
            TransportError::Status { .. } => "api_error",
            TransportError::Connection { .. } => "connection_error",
            TransportError::Timeout(_) => "timeout_error",
            TransportError::Cancelled => "cancelled",
        }
    }
}

impl ClientError {
    /// Get HTTP status code
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Transport(e) => e.status_code(),
            _ => None,
        }
    }

    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ClientError::Configuration(_) => "configuration_error",
            ClientError::Validation(_) => "validation_error",
            ClientError::Transport(e) => e.error_type(),
            ClientError::Decoding(_) => "decoding_error",
        }
    }

    /// Whether detailed error information should be logged
    pub fn should_log_details(&self) -> bool {
        !matches!(
            self,
            ClientError::Transport(TransportError::Authentication { .. })
                | ClientError::Transport(TransportError::Permission { .. })
        )
    }

    /// Whether the caller cancelled the request
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Transport(TransportError::Cancelled))
    }
}

/// Result type alias
pub type ClientResult<T> = Result<T, ClientError>;

/// Error handling helper functions
pub mod helpers {
    use super::*;

    /// Create configuration error
    pub fn config_error(message: impl Into<String>) -> ClientError {
        ClientError::Configuration(message.into())
    }

    /// Create validation error
    pub fn validation_error(message: impl Into<String>) -> ClientError {
        ClientError::Validation(message.into())
    }

    /// Create decoding error
    pub fn decoding_error(message: impl Into<String>) -> ClientError {
        ClientError::Decoding(message.into())
    }
}

/// Error context extension trait
pub trait ErrorContext<T> {
    /// Add configuration error context
    fn config_context(self, message: &str) -> ClientResult<T>;

    /// Add validation error context
    fn validation_context(self, message: &str) -> ClientResult<T>;

    /// Add decoding error context
    fn decoding_context(self, message: &str) -> ClientResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn config_context(self, message: &str) -> ClientResult<T> {
        self.map_err(|e| ClientError::Configuration(format!("{}: {}", message, e)))
    }

    fn validation_context(self, message: &str) -> ClientResult<T> {
        self.map_err(|e| ClientError::Validation(format!("{}: {}", message, e)))
    }

    fn decoding_context(self, message: &str) -> ClientResult<T> {
        self.map_err(|e| ClientError::Decoding(format!("{}: {}", message, e)))
    }
}

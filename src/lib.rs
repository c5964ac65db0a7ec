//! Workers AI client library
//!
//! Typed async client for the Cloudflare Workers AI inference API

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

// Re-export common types
pub use config::{ClientConfig, ClientConfigBuilder, LoggingConfig};
pub use models::{catalog, request, response};
pub use services::{HttpTransport, TextGenerationStream, Transport, WorkersAi};
pub use tokio_util::sync::CancellationToken;
pub use utils::error::{ClientError, ClientResult, TransportError};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}

//! Configuration management module
//!
//! Responsible for building the client configuration, either directly or from environment variables.

pub mod settings;

pub use settings::{ClientConfig, ClientConfigBuilder, LoggingConfig};

//! Configuration module unit tests

use std::env;
use std::sync::Mutex;
use workers_ai::config::settings::{ClientConfigBuilder, DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECONDS};
use workers_ai::{ClientConfig, ClientError, LoggingConfig};

/// Environment variables are process-global
static ENV_LOCK: Mutex<()> = Mutex::new(());

const VARS: [&str; 7] = [
    "CLOUDFLARE_API_KEY",
    "CLOUDFLARE_ACCOUNT_ID",
    "CLOUDFLARE_AI_GATEWAY_URL",
    "CLOUDFLARE_AI_RETRIES",
    "CLOUDFLARE_AI_TIMEOUT",
    "RUST_LOG",
    "LOG_FORMAT",
];

/// Clean up test environment variables
fn cleanup_test_env() {
    for var in &VARS {
        env::remove_var(var);
    }
}

/// Setup test environment variables
fn setup_test_env() {
    cleanup_test_env();
    env::set_var("CLOUDFLARE_API_KEY", "cf-test-key-1234567890");
    env::set_var("CLOUDFLARE_ACCOUNT_ID", "acc-from-env");
}

#[test]
fn test_config_new_uses_defaults() {
    let config = ClientConfig::new("key", "acc").unwrap();

    assert_eq!(config.api_key(), "key");
    assert_eq!(config.account_identifier(), "acc");
    assert_eq!(config.gateway_url(), None);
    assert_eq!(config.retries(), DEFAULT_RETRIES);
    assert_eq!(config.timeout_seconds(), DEFAULT_TIMEOUT_SECONDS);
}

#[test]
fn test_builder_overrides() {
    let config = ClientConfig::builder()
        .api_key("key")
        .account_identifier("acc")
        .retries(3)
        .timeout_seconds(5)
        .build()
        .unwrap();

    assert_eq!(config.retries(), 3);
    assert_eq!(config.timeout_seconds(), 5);
}

#[test]
fn test_builder_missing_fields() {
    let missing_key = ClientConfig::builder().account_identifier("acc").build();
    assert!(matches!(missing_key, Err(ClientError::Configuration(_))));

    let missing_account = ClientConfig::builder().api_key("key").build();
    assert!(matches!(missing_account, Err(ClientError::Configuration(_))));
}

#[test]
fn test_zero_timeout_rejected() {
    let result = ClientConfig::builder()
        .api_key("key")
        .account_identifier("acc")
        .timeout_seconds(0)
        .build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[test]
fn test_invalid_gateway_rejected() {
    let result = ClientConfig::builder()
        .api_key("key")
        .account_identifier("acc")
        .gateway_url("gateway.example.com")
        .build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[test]
fn test_config_from_env() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    setup_test_env();
    env::set_var("CLOUDFLARE_AI_RETRIES", "4");
    env::set_var("CLOUDFLARE_AI_TIMEOUT", "15");
    env::set_var("CLOUDFLARE_AI_GATEWAY_URL", "https://gateway.example.com/v1/a/b/workers-ai/");

    let config = ClientConfig::from_env();
    cleanup_test_env();

    let config = config.unwrap();
    assert_eq!(config.api_key(), "cf-test-key-1234567890");
    assert_eq!(config.account_identifier(), "acc-from-env");
    assert_eq!(config.retries(), 4);
    assert_eq!(config.timeout_seconds(), 15);
    assert_eq!(config.base_url(), "https://gateway.example.com/v1/a/b/workers-ai");
}

#[test]
fn test_builder_values_take_precedence_over_env() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    setup_test_env();

    let config = ClientConfigBuilder::from_env().map(|b| b.account_identifier("explicit").build());
    cleanup_test_env();

    let config = config.unwrap().unwrap();
    assert_eq!(config.api_key(), "cf-test-key-1234567890");
    assert_eq!(config.account_identifier(), "explicit");
}

#[test]
fn test_config_from_env_missing_api_key() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_test_env();
    env::set_var("CLOUDFLARE_ACCOUNT_ID", "acc");

    let result = ClientConfig::from_env();
    cleanup_test_env();

    let err = result.unwrap_err();
    assert!(matches!(err, ClientError::Configuration(_)));
    assert!(err.to_string().contains("CLOUDFLARE_API_KEY"));
}

#[test]
fn test_config_from_env_invalid_number() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    setup_test_env();
    env::set_var("CLOUDFLARE_AI_RETRIES", "many");

    let result = ClientConfig::from_env();
    cleanup_test_env();

    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[test]
fn test_logging_config_from_env() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_test_env();
    env::set_var("RUST_LOG", "debug");
    env::set_var("LOG_FORMAT", "json");

    let config = LoggingConfig::from_env();
    env::set_var("LOG_FORMAT", "yaml");
    let invalid = LoggingConfig::from_env();
    cleanup_test_env();

    let config = config.unwrap();
    assert_eq!(config.level, "debug");
    assert!(config.is_json());
    assert!(invalid.is_err());
}

#[test]
fn test_logging_config_defaults() {
    let config = LoggingConfig::default();
    assert_eq!(config.level, "info");
    assert!(!config.is_json());
}

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

/// Service configuration, sourced from `PROCESSOR_*` environment variables.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Queue URL to drain. Required; startup aborts without it.
    pub queue_url: String,

    /// Custom queue service endpoint for non-production emulation.
    #[serde(default)]
    pub queue_endpoint: Option<String>,

    /// Environment label, used for metrics file naming.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Number of concurrently processed orders.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Simulated downstream work duration in seconds.
    #[serde(default = "default_simulated_work_secs")]
    pub simulated_work_secs: u64,

    /// Max messages per receive call.
    #[serde(default = "default_receive_batch_size")]
    pub receive_batch_size: usize,

    /// Long-poll wait per receive call in seconds.
    #[serde(default = "default_receive_wait_secs")]
    pub receive_wait_secs: u64,

    /// Visibility timeout requested per receive, in seconds.
    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: u64,

    /// Backoff after a failed receive, in seconds.
    #[serde(default = "default_receive_backoff_secs")]
    pub receive_backoff_secs: u64,

    /// Directory the metrics file is written to.
    #[serde(default = "default_metrics_dir")]
    pub metrics_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // OpenTelemetry configuration
    /// OpenTelemetry OTLP endpoint (gRPC)
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    /// Enable OpenTelemetry export
    #[serde(default = "default_otel_enabled")]
    pub otel_enabled: bool,

    /// Service name for the OpenTelemetry resource
    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_environment() -> String {
    "aws".to_string()
}

fn default_concurrency() -> usize {
    1
}

fn default_simulated_work_secs() -> u64 {
    3
}

fn default_receive_batch_size() -> usize {
    10
}

fn default_receive_wait_secs() -> u64 {
    20
}

fn default_visibility_timeout_secs() -> u64 {
    60
}

fn default_receive_backoff_secs() -> u64 {
    2
}

fn default_metrics_dir() -> String {
    ".".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_enabled() -> bool {
    false
}

fn default_otel_service_name() -> String {
    "order-processor".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("PROCESSOR"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure tests run serially and don't interfere with each other
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_with_queue_url_set() {
        let _lock = TEST_LOCK.lock().unwrap();

        // SAFETY: Test runs with mutex lock to prevent concurrent env access
        unsafe {
            std::env::set_var("PROCESSOR_QUEUE_URL", "https://sqs.example.com/orders");
            std::env::remove_var("PROCESSOR_CONCURRENCY");
        }

        let config = ServiceConfig::from_env().unwrap();

        assert_eq!(config.queue_url, "https://sqs.example.com/orders");
        assert_eq!(config.queue_endpoint, None);
        assert_eq!(config.environment, "aws");
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.simulated_work_secs, 3);
        assert_eq!(config.receive_batch_size, 10);
        assert_eq!(config.receive_wait_secs, 20);
        assert_eq!(config.visibility_timeout_secs, 60);
        assert_eq!(config.receive_backoff_secs, 2);
        assert_eq!(config.metrics_dir, ".");
        assert_eq!(config.log_level, "info");
        assert!(!config.otel_enabled);

        // SAFETY: Test runs with mutex lock to prevent concurrent env access
        unsafe {
            std::env::remove_var("PROCESSOR_QUEUE_URL");
        }
    }

    #[test]
    fn test_missing_queue_url_is_fatal() {
        let _lock = TEST_LOCK.lock().unwrap();

        // SAFETY: Test runs with mutex lock to prevent concurrent env access
        unsafe {
            std::env::remove_var("PROCESSOR_QUEUE_URL");
        }

        assert!(ServiceConfig::from_env().is_err());
    }

    #[test]
    fn test_custom_values_override_defaults() {
        let _lock = TEST_LOCK.lock().unwrap();

        // SAFETY: Test runs with mutex lock to prevent concurrent env access
        unsafe {
            std::env::set_var("PROCESSOR_QUEUE_URL", "https://sqs.example.com/orders");
            std::env::set_var("PROCESSOR_CONCURRENCY", "8");
            std::env::set_var("PROCESSOR_QUEUE_ENDPOINT", "http://localhost:4566");
            std::env::set_var("PROCESSOR_ENVIRONMENT", "local");
        }

        let config = ServiceConfig::from_env().unwrap();

        assert_eq!(config.concurrency, 8);
        assert_eq!(
            config.queue_endpoint.as_deref(),
            Some("http://localhost:4566")
        );
        assert_eq!(config.environment, "local");

        // SAFETY: Test runs with mutex lock to prevent concurrent env access
        unsafe {
            std::env::remove_var("PROCESSOR_QUEUE_URL");
            std::env::remove_var("PROCESSOR_CONCURRENCY");
            std::env::remove_var("PROCESSOR_QUEUE_ENDPOINT");
            std::env::remove_var("PROCESSOR_ENVIRONMENT");
        }
    }
}

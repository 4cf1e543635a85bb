//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the handler.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the fan-out handler.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FanoutConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single downstream service every item is posted to.
    pub downstream: DownstreamConfig,

    /// Fan-out concurrency settings.
    pub dispatch: DispatchConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Downstream target configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Full URL each item is POSTed to (e.g., "http://blogcount/").
    pub url: String,

    /// Upper bound on a buffered downstream response body.
    pub max_response_bytes: usize,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://blogcount/".to_string(),
            max_response_bytes: 1024 * 1024,
        }
    }
}

/// Fan-out concurrency configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum outbound calls in flight for a single batch.
    pub max_in_flight: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { max_in_flight: 64 }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Downstream connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Bound on a single downstream call, request to end of body.
    pub call_ms: u64,

    /// Whole inbound request timeout in seconds.
    pub request_secs: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn call(&self) -> Duration {
        Duration::from_millis(self.call_ms)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    /// Budget for a whole batch: the request timeout less a tenth, so every
    /// slot is settled and the aggregate is written before the request expires.
    pub fn batch(&self) -> Duration {
        let request = self.request();
        request - request / 10
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 2_000,
            call_ms: 10_000,
            request_secs: 60,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Inbound request hardening.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

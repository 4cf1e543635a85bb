//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, concurrency > 0)
//! - Check the downstream URL is something the HTTP client can reach
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FanoutConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::FanoutConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &FanoutConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    match Url::parse(&config.downstream.url) {
        Ok(url) => {
            if url.scheme() != "http" {
                errors.push(ValidationError::new(
                    "downstream.url",
                    format!("scheme '{}' is not supported, use http", url.scheme()),
                ));
            }
            if url.host_str().is_none() {
                errors.push(ValidationError::new("downstream.url", "missing host"));
            }
        }
        Err(e) => errors.push(ValidationError::new(
            "downstream.url",
            format!("'{}' is not a URL: {}", config.downstream.url, e),
        )),
    }

    if config.downstream.max_response_bytes == 0 {
        errors.push(ValidationError::new("downstream.max_response_bytes", "must be > 0"));
    }

    if config.dispatch.max_in_flight == 0 {
        errors.push(ValidationError::new("dispatch.max_in_flight", "must be > 0"));
    }

    let timeouts = &config.timeouts;
    if timeouts.connect_ms == 0 {
        errors.push(ValidationError::new("timeouts.connect_ms", "must be > 0"));
    }
    if timeouts.call_ms == 0 {
        errors.push(ValidationError::new("timeouts.call_ms", "must be > 0"));
    }
    if timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    } else if timeouts.request_secs.saturating_mul(1000) < timeouts.call_ms {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must not be shorter than timeouts.call_ms",
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be > 0"));
    }

    let observability = &config.observability;
    if tracing_subscriber::EnvFilter::try_new(&observability.log_level).is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("'{}' is not a valid filter", observability.log_level),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&FanoutConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = FanoutConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.downstream.url = "https://blogcount/".into();
        config.dispatch.max_in_flight = 0;
        config.timeouts.call_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "downstream.url",
                "dispatch.max_in_flight",
                "timeouts.call_ms",
            ]
        );
    }

    #[test]
    fn test_request_timeout_must_cover_call_timeout() {
        let mut config = FanoutConfig::default();
        config.timeouts.request_secs = 1;
        config.timeouts.call_ms = 5_000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = FanoutConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}

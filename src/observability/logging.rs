//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Pick the log level from `RUST_LOG`, falling back to config
//!
//! # Design Decisions
//! - JSON format for production, pretty format for development
//! - Initialization failure (subscriber already set) is reported, not fatal

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global subscriber described by `config`.
pub fn init(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    }
}

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and HTTP layer produce:
//!     → logging.rs (structured log events, request-id spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows into every span of an invocation
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

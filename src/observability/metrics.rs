//! Metrics collection and exposition.
//!
//! # Metrics
//! - `fanout_invocations_total` (counter): invocations by response status
//! - `fanout_invocation_duration_seconds` (histogram): invocation latency
//! - `fanout_batch_size` (histogram): items per accepted batch
//! - `fanout_calls_total` (counter): downstream calls by outcome
//! - `fanout_calls_in_flight` (gauge): downstream calls currently running
//! - `fanout_protocol_faults_total` (counter): aborted invocations
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::fanout::outcome::CallOutcome;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished invocation.
pub fn record_invocation(status: u16, start: Instant) {
    metrics::counter!("fanout_invocations_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("fanout_invocation_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_batch_size(size: usize) {
    metrics::histogram!("fanout_batch_size").record(size as f64);
}

pub fn record_call(outcome: &CallOutcome) {
    metrics::counter!("fanout_calls_total", "outcome" => outcome.label()).increment(1);
}

pub fn record_protocol_fault() {
    metrics::counter!("fanout_protocol_faults_total").increment(1);
}

/// Tracks one running downstream call; the gauge drops again when this does,
/// including when the call task is aborted.
pub struct InFlightCall(());

impl InFlightCall {
    pub fn start() -> Self {
        metrics::gauge!("fanout_calls_in_flight").increment(1.0);
        Self(())
    }
}

impl Drop for InFlightCall {
    fn drop(&mut self) {
        metrics::gauge!("fanout_calls_in_flight").decrement(1.0);
    }
}

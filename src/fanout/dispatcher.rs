//! Fan-out dispatch.
//!
//! # Responsibilities
//! - Issue exactly one outbound call per batch item
//! - Bound the number of calls in flight
//! - Bound every call in time so each one reports exactly once
//! - Feed `(index, outcome)` reports to the aggregator
//!
//! # Data Flow
//! ```text
//! Batch
//!     → one task per item (index moved in by value)
//!     → semaphore permit (before the batch deadline)
//!     → downstream call under min(call timeout, time left in the batch)
//!     → CallReport { index, outcome } over mpsc
//!     → Aggregator (single owner of the slots)
//!     → AggregateResult
//! ```
//!
//! # Design Decisions
//! - Call tasks live in a `JoinSet`, so an aborted invocation aborts them too
//! - The call timeout starts once a permit is held; the batch deadline starts
//!   at dispatch and also covers time spent queued for a permit

use std::sync::Arc;
use std::time::Duration;

use axum::http::uri::InvalidUri;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{self, Instant};

use crate::config::FanoutConfig;
use crate::fanout::aggregator::Aggregator;
use crate::fanout::batch::Batch;
use crate::fanout::downstream::{Downstream, HttpDownstream};
use crate::fanout::error::FanoutError;
use crate::fanout::outcome::{AggregateResult, CallOutcome, CallReport};
use crate::observability::metrics;
use crate::resilience::timeouts::{call_with_deadline, millis};

/// Sends every item of a batch to one downstream and gathers the outcomes.
#[derive(Clone)]
pub struct Dispatcher {
    downstream: Arc<dyn Downstream>,
    max_in_flight: usize,
    call_timeout: Duration,
    batch_timeout: Option<Duration>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("max_in_flight", &self.max_in_flight)
            .field("call_timeout", &self.call_timeout)
            .field("batch_timeout", &self.batch_timeout)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// `max_in_flight` is clamped to at least one. Batches are unbounded in
    /// time until [`Dispatcher::with_batch_timeout`] sets a budget.
    pub fn new(downstream: Arc<dyn Downstream>, max_in_flight: usize, call_timeout: Duration) -> Self {
        Self {
            downstream,
            max_in_flight: max_in_flight.max(1),
            call_timeout,
            batch_timeout: None,
        }
    }

    /// Settle every slot within `limit` of dispatch, queued items included.
    pub fn with_batch_timeout(mut self, limit: Duration) -> Self {
        self.batch_timeout = Some(limit);
        self
    }

    /// Build a dispatcher that talks HTTP to the configured downstream.
    pub fn from_config(config: &FanoutConfig) -> Result<Self, InvalidUri> {
        let downstream = HttpDownstream::from_config(&config.downstream, &config.timeouts)?;
        tracing::debug!(downstream = %downstream.uri(), "Downstream client ready");
        Ok(Self::new(
            Arc::new(downstream),
            config.dispatch.max_in_flight,
            config.timeouts.call(),
        )
        .with_batch_timeout(config.timeouts.batch()))
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Dispatch one call per item and wait for all of them.
    ///
    /// Individual failures and timeouts are recorded per slot; only a
    /// correlation fault fails the whole dispatch.
    pub async fn dispatch(&self, batch: Batch) -> Result<AggregateResult, FanoutError> {
        let start = Instant::now();
        let count = batch.len();
        let mut aggregator = Aggregator::new(count);

        if batch.is_empty() {
            return aggregator.finish();
        }

        let deadline = self.batch_timeout.and_then(|limit| start.checked_add(limit));
        let (report_tx, mut report_rx) = mpsc::channel::<CallReport>(count);
        let permits = Arc::new(Semaphore::new(self.max_in_flight));
        let mut calls = JoinSet::new();

        for (index, item) in batch.into_items() {
            let downstream = Arc::clone(&self.downstream);
            let permits = Arc::clone(&permits);
            let report_tx = report_tx.clone();
            let call_timeout = self.call_timeout;

            calls.spawn(async move {
                let outcome = match acquire_permit(permits, start, deadline).await {
                    Ok(_permit) => {
                        let _in_flight = metrics::InFlightCall::start();
                        let limit = match deadline {
                            Some(deadline) => {
                                call_timeout.min(deadline.saturating_duration_since(Instant::now()))
                            }
                            None => call_timeout,
                        };
                        match serde_json::to_vec(&item) {
                            Ok(body) => call_with_deadline(limit, downstream.call(body)).await,
                            Err(e) => CallOutcome::Failure {
                                status: None,
                                message: format!("failed to serialize item: {e}"),
                            },
                        }
                    }
                    Err(outcome) => outcome,
                };
                metrics::record_call(&outcome);

                let _ = report_tx.send(CallReport { index, outcome }).await;
            });
        }
        drop(report_tx);

        tracing::debug!(
            batch_size = count,
            max_in_flight = self.max_in_flight,
            "Batch dispatched"
        );

        while let Some(report) = report_rx.recv().await {
            tracing::debug!(
                index = report.index,
                outcome = report.outcome.label(),
                "Call completed"
            );
            if let Err(e) = aggregator.record(report) {
                tracing::error!(error = %e, "Aborting dispatch");
                return Err(e);
            }
        }

        while let Some(joined) = calls.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Call task did not complete");
            }
        }

        if !aggregator.is_complete() {
            tracing::error!(
                batch_size = count,
                reported = aggregator.filled(),
                "Call reports missing"
            );
        }

        let result = aggregator.finish()?;
        tracing::info!(
            batch_size = count,
            succeeded = result.succeeded(),
            elapsed_ms = millis(start.elapsed()),
            "Batch aggregated"
        );
        Ok(result)
    }
}

/// Wait for a concurrency slot, giving up with a terminal outcome once the
/// batch deadline passes.
async fn acquire_permit(
    permits: Arc<Semaphore>,
    start: Instant,
    deadline: Option<Instant>,
) -> Result<OwnedSemaphorePermit, CallOutcome> {
    let acquired = match deadline {
        Some(deadline) => match time::timeout_at(deadline, permits.acquire_owned()).await {
            Ok(acquired) => acquired,
            Err(_) => {
                return Err(CallOutcome::Timeout {
                    after_ms: millis(start.elapsed()),
                })
            }
        },
        None => permits.acquire_owned().await,
    };

    // The semaphore is never closed while the dispatch holds it.
    acquired.map_err(|e| CallOutcome::Failure {
        status: None,
        message: format!("concurrency limiter unavailable: {e}"),
    })
}

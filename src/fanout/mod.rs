//! Batch fan-out subsystem.
//!
//! # Data Flow
//! ```text
//! Invocation { body }
//!     → batch.rs (must be a JSON array, else InvalidInput / 400)
//!     → dispatcher.rs (one bounded, deadline-guarded call per item)
//!     → downstream.rs (POST item JSON, read body to end)
//!     → aggregator.rs (slot i ← outcome of item i)
//!     → outcome.rs (AggregateResult { count, responses })
//!     → InvocationResponse { 200, payload }
//! ```
//!
//! # Design Decisions
//! - Per-item failures and timeouts are data in their slot, never batch errors
//! - Only malformed input and correlation faults abort an invocation
//! - One round of calls per invocation; nothing persists between invocations

pub mod aggregator;
pub mod batch;
pub mod dispatcher;
pub mod downstream;
pub mod error;
pub mod invocation;
pub mod outcome;

pub use aggregator::Aggregator;
pub use batch::Batch;
pub use dispatcher::Dispatcher;
pub use downstream::{Downstream, DownstreamError, HttpDownstream};
pub use error::FanoutError;
pub use invocation::{handle, Invocation, InvocationResponse};
pub use outcome::{AggregateResult, CallOutcome, CallReport};

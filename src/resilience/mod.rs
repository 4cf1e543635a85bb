//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call to downstream:
//!     → timeouts.rs (enforce per-call deadline)
//!     → terminal CallOutcome (success, failure or timeout)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries at this layer: a failed item is reported, not re-sent

pub mod timeouts;

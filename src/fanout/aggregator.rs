//! Fan-in of call reports into ordered slots.
//!
//! # Responsibilities
//! - Own the slot array for one batch (one slot per item)
//! - Fill slot `i` from the report tagged with index `i`
//! - Detect correlation faults: duplicates, out-of-range indices, missing reports
//!
//! # Design Decisions
//! - Single owner; call tasks reach it only through a channel
//! - A filled slot is never overwritten

use crate::fanout::error::FanoutError;
use crate::fanout::outcome::{AggregateResult, CallOutcome, CallReport};

/// Collects `(index, outcome)` reports for a batch of known size.
#[derive(Debug)]
pub struct Aggregator {
    slots: Vec<Option<CallOutcome>>,
    filled: usize,
}

impl Aggregator {
    /// Create an aggregator with `count` pending slots.
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
            filled: 0,
        }
    }

    /// Number of slots holding an outcome.
    pub fn filled(&self) -> usize {
        self.filled
    }

    pub fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    /// Fill the slot named by the report.
    pub fn record(&mut self, report: CallReport) -> Result<(), FanoutError> {
        let count = self.slots.len();
        let slot = self.slots.get_mut(report.index).ok_or_else(|| {
            FanoutError::ProtocolFault(format!(
                "report for index {} in a batch of {}",
                report.index, count
            ))
        })?;

        if let Some(existing) = slot {
            return Err(FanoutError::ProtocolFault(format!(
                "slot {} reported twice (already {}, then {})",
                report.index,
                existing.label(),
                report.outcome.label()
            )));
        }

        *slot = Some(report.outcome);
        self.filled += 1;
        Ok(())
    }

    /// Produce the final result. Every slot must be filled.
    pub fn finish(self) -> Result<AggregateResult, FanoutError> {
        let count = self.slots.len();
        let mut responses = Vec::with_capacity(count);
        for (index, slot) in self.slots.into_iter().enumerate() {
            match slot {
                Some(outcome) => responses.push(outcome),
                None => {
                    return Err(FanoutError::ProtocolFault(format!(
                        "slot {index} never reported"
                    )))
                }
            }
        }

        Ok(AggregateResult { count, responses })
    }
}

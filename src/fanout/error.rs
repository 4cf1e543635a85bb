//! Invocation-level error definitions.

use thiserror::Error;

/// Errors that abort a whole fan-out invocation.
///
/// Per-item failures and timeouts are not errors; they are recorded as
/// [`CallOutcome`](super::outcome::CallOutcome) data in the item's slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FanoutError {
    /// The request body was absent or not an array. No calls were made.
    #[error("{0}")]
    InvalidInput(String),

    /// Index correlation between dispatcher and aggregator broke down.
    #[error("protocol fault: {0}")]
    ProtocolFault(String),
}

impl FanoutError {
    /// HTTP-equivalent status the invocation reports for this error.
    pub fn status(&self) -> u16 {
        match self {
            FanoutError::InvalidInput(_) => 400,
            FanoutError::ProtocolFault(_) => 500,
        }
    }
}

//! Per-call outcomes and the aggregated result.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

/// Terminal result of one outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// Response body, read to end of stream.
    Success(String),
    /// Transport error or non-2xx status. `status` is absent for transport errors.
    Failure { status: Option<u16>, message: String },
    /// The call did not finish within the per-call bound.
    Timeout { after_ms: u64 },
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            CallOutcome::Success(_) => "success",
            CallOutcome::Failure { .. } => "failure",
            CallOutcome::Timeout { .. } => "timeout",
        }
    }
}

// Successes serialize as the bare body string; failures as tagged objects.
impl Serialize for CallOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CallOutcome::Success(body) => serializer.serialize_str(body),
            CallOutcome::Failure { status, message } => {
                let mut state = serializer.serialize_struct("CallFailure", 3)?;
                state.serialize_field("error", "call_failure")?;
                state.serialize_field("status", status)?;
                state.serialize_field("message", message)?;
                state.end()
            }
            CallOutcome::Timeout { after_ms } => {
                let mut state = serializer.serialize_struct("CallTimeout", 2)?;
                state.serialize_field("error", "timeout")?;
                state.serialize_field("after_ms", after_ms)?;
                state.end()
            }
        }
    }
}

/// Completion message sent from a call task to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReport {
    /// Position of the item in the batch, fixed at dispatch time.
    pub index: usize,
    pub outcome: CallOutcome,
}

/// Final, fully-populated result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub count: usize,
    /// `responses[i]` is the outcome of the call made for `batch[i]`.
    pub responses: Vec<CallOutcome>,
}

impl AggregateResult {
    pub fn succeeded(&self) -> usize {
        self.responses.iter().filter(|o| o.is_success()).count()
    }
}

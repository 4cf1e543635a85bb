//! Framework-independent entry point.
//!
//! An [`Invocation`] carries the request body; the reply is a status code and
//! a serialized JSON payload, ready for any outer framework to send on.

use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;

use crate::fanout::batch::Batch;
use crate::fanout::dispatcher::Dispatcher;
use crate::fanout::error::FanoutError;
use crate::fanout::outcome::AggregateResult;
use crate::observability::metrics;

/// Request-like input: only the body is consulted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Invocation {
    #[serde(default)]
    pub body: Option<Value>,
}

impl Invocation {
    pub fn new(body: Value) -> Self {
        Self { body: Some(body) }
    }

    /// Interpret raw HTTP body bytes.
    ///
    /// Empty bodies are absent; bodies that are not JSON are kept as a JSON
    /// string of their text so they can be echoed back in the error message.
    pub fn from_http_body(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self { body: None };
        }

        let body = serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()));
        Self { body: Some(body) }
    }
}

/// Status code plus serialized JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResponse {
    pub status: u16,
    pub payload: String,
}

impl InvocationResponse {
    fn processed(result: &AggregateResult) -> Self {
        match serde_json::to_string(result) {
            Ok(payload) => Self { status: 200, payload },
            Err(e) => Self::from_error(&FanoutError::ProtocolFault(format!(
                "failed to serialize result: {e}"
            ))),
        }
    }

    /// Errors are reported as a JSON-encoded string.
    fn from_error(err: &FanoutError) -> Self {
        Self {
            status: err.status(),
            payload: Value::String(err.to_string()).to_string(),
        }
    }
}

/// Validate the body, fan the batch out, and render the reply.
pub async fn handle(dispatcher: &Dispatcher, invocation: Invocation) -> InvocationResponse {
    let start = Instant::now();

    let response = match Batch::from_body(invocation.body) {
        Ok(batch) => {
            metrics::record_batch_size(batch.len());
            match dispatcher.dispatch(batch).await {
                Ok(result) => InvocationResponse::processed(&result),
                Err(e) => {
                    metrics::record_protocol_fault();
                    tracing::error!(error = %e, "Invocation aborted");
                    InvocationResponse::from_error(&e)
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rejected invocation");
            InvocationResponse::from_error(&e)
        }
    };

    metrics::record_invocation(response.status, start);
    response
}

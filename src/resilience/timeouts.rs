//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap downstream calls with a deadline
//! - Fold every call result (including expiry) into a terminal outcome
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry
//! - Timeouts are distinct from other failures

use std::future::Future;
use std::time::Duration;
use tokio::time;

use crate::fanout::downstream::DownstreamError;
use crate::fanout::outcome::CallOutcome;

/// Run a downstream call under `limit`, always producing a terminal outcome.
pub async fn call_with_deadline<F>(limit: Duration, call: F) -> CallOutcome
where
    F: Future<Output = Result<String, DownstreamError>>,
{
    match time::timeout(limit, call).await {
        Ok(Ok(body)) => CallOutcome::Success(body),
        Ok(Err(e)) => e.into(),
        Err(_) => CallOutcome::Timeout {
            after_ms: millis(limit),
        },
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fast_call_succeeds() {
        let outcome = call_with_deadline(Duration::from_secs(1), async {
            Ok::<_, DownstreamError>("done".to_string())
        })
        .await;
        assert_eq!(outcome, CallOutcome::Success("done".into()));
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let outcome = call_with_deadline(Duration::from_millis(20), async {
            time::sleep(Duration::from_secs(30)).await;
            Ok::<_, DownstreamError>("late".to_string())
        })
        .await;
        assert_eq!(outcome, CallOutcome::Timeout { after_ms: 20 });
    }

    #[test]
    fn test_millis_saturates() {
        assert_eq!(millis(Duration::from_millis(1_500)), 1_500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}

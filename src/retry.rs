//! Bounded retry of one unit's stage operation.
//!
//! Stage code contains no retry logic; the orchestrator wraps each unit's
//! operation in [`execute`], which contains per-unit failures and only lets
//! fatal errors escape.

use crate::error::{PodquoteError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Attempt limit and wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub wait_on_failure: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, wait_on_failure: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            wait_on_failure,
        }
    }
}

/// How a retried operation ended, short of a fatal error.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Completed(T),
    /// Every attempt failed; the caller skips the unit.
    Exhausted {
        attempts: u32,
        last_error: PodquoteError,
    },
}

/// Run `op` up to `policy.max_attempts` times.
///
/// `on_failed_attempt` sees every failed attempt (1-based) before the wait; an
/// error it returns aborts immediately. Fatal errors from `op` are returned as
/// `Err` without retrying. Non-retryable errors exhaust after one attempt.
pub async fn execute<T, Op, Fut, OnFail>(
    policy: RetryPolicy,
    mut op: Op,
    mut on_failed_attempt: OnFail,
) -> Result<RetryOutcome<T>>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
    OnFail: FnMut(u32, &PodquoteError) -> Result<()>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        let err = match op(attempt).await {
            Ok(value) => return Ok(RetryOutcome::Completed(value)),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => e,
        };

        on_failed_attempt(attempt, &err)?;

        if attempt >= policy.max_attempts || !err.is_retryable() {
            return Ok(RetryOutcome::Exhausted {
                attempts: attempt,
                last_error: err,
            });
        }

        warn!(
            "Attempt {}/{} failed: {}. Retrying in {:?}",
            attempt, policy.max_attempts, err, policy.wait_on_failure
        );
        if !policy.wait_on_failure.is_zero() {
            tokio::time::sleep(policy.wait_on_failure).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let mut failures = Vec::new();

        let outcome = execute(
            policy(3),
            |attempt| {
                calls.set(calls.get() + 1);
                async move {
                    if attempt < 3 {
                        Err(PodquoteError::service("test", "503"))
                    } else {
                        Ok(attempt)
                    }
                }
            },
            |attempt, _| {
                failures.push(attempt);
                Ok(())
            },
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RetryOutcome::Completed(3)));
        assert_eq!(calls.get(), 3);
        assert_eq!(failures, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_exhausts_at_bound() {
        let calls = Cell::new(0);
        let outcome: RetryOutcome<()> = execute(
            policy(2),
            |_| {
                calls.set(calls.get() + 1);
                async { Err(PodquoteError::MalformedResponse("not json".into())) }
            },
            |_, _| Ok(()),
        )
        .await
        .unwrap();

        match outcome {
            RetryOutcome::Exhausted { attempts, last_error } => {
                assert_eq!(attempts, 2);
                assert!(matches!(last_error, PodquoteError::MalformedResponse(_)));
            }
            RetryOutcome::Completed(_) => panic!("expected exhaustion"),
        }
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_stops_after_one_attempt() {
        let calls = Cell::new(0);
        let outcome: RetryOutcome<()> = execute(
            policy(5),
            |_| {
                calls.set(calls.get() + 1);
                async { Err(PodquoteError::AlignmentNotFound("gone".into())) }
            },
            |_, _| Ok(()),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RetryOutcome::Exhausted { attempts: 1, .. }));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_fatal_error_propagates() {
        let result: Result<RetryOutcome<()>> = execute(
            policy(3),
            |_| async {
                Err(PodquoteError::persistence(
                    std::path::Path::new("quotes.json"),
                    "read-only file system",
                ))
            },
            |_, _| panic!("fatal errors are not attempts"),
        )
        .await;

        assert!(matches!(result, Err(PodquoteError::Persistence { .. })));
    }

    #[tokio::test]
    async fn test_failing_hook_aborts() {
        let result: Result<RetryOutcome<()>> = execute(
            policy(3),
            |_| async { Err(PodquoteError::service("test", "timeout")) },
            |_, _| Err(PodquoteError::Config("checkpoint gone".into())),
        )
        .await;

        assert!(matches!(result, Err(PodquoteError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts() {
        let start = tokio::time::Instant::now();
        let _: RetryOutcome<()> = execute(
            RetryPolicy::new(3, Duration::from_secs(300)),
            |_| async { Err(PodquoteError::service("test", "429")) },
            |_, _| Ok(()),
        )
        .await
        .unwrap();

        // Two waits: after attempts 1 and 2, none after the last
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(600) && waited < Duration::from_secs(900));
    }
}

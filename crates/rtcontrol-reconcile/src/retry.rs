// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Retry executor with jittered exponential backoff.
//!
//! Every remote call made by the engine goes through [`execute`]:
//!
//! 1. Attempt 0 runs immediately.
//! 2. Permanent failures (see [`crate::classify`]) return at once.
//! 3. Transient failures are retried up to `max_retries` times, waiting
//!    [`RetryPolicy::backoff`] between attempts.
//! 4. The wait races the context's cancellation token and deadline; either one
//!    ends the call with a cancellation-specific error.
//! 5. On exhaustion the last operation error is returned as-is.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::classify::Classify;

/// Retries after the first attempt (4 attempts in total).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Backoff and retry limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Base wait before the first retry.
    pub initial_backoff: Duration,
    /// Growth factor per attempt.
    pub multiplier: u32,
    /// Ceiling for the base wait.
    pub max_backoff: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            multiplier: 4,
            max_backoff: Duration::from_secs(30),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that makes exactly one attempt.
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set the initial backoff.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Set the growth factor.
    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the backoff ceiling.
    pub fn with_max_backoff(mut self, max: Duration) -> Self {
        self.max_backoff = max;
        self
    }

    /// Set the number of retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Un-jittered wait after the given 0-indexed attempt:
    /// `initial * multiplier^attempt`, capped at `max_backoff`.
    ///
    /// Saturates instead of overflowing, so any attempt number is valid.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let initial = u64::try_from(self.initial_backoff.as_nanos()).unwrap_or(u64::MAX);
        let factor = u64::from(self.multiplier).saturating_pow(attempt);
        Duration::from_nanos(initial.saturating_mul(factor)).min(self.max_backoff)
    }

    /// Jittered wait after the given attempt, uniform in `[base/2, base]`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let floor = base / 2;
        let spread = u64::try_from((base - floor).as_nanos()).unwrap_or(u64::MAX);
        let jitter = rand::thread_rng().gen_range(0..=spread);
        floor + Duration::from_nanos(jitter)
    }
}

/// Jittered wait for `attempt` under the default policy.
pub fn backoff(attempt: u32) -> Duration {
    RetryPolicy::default().backoff(attempt)
}

/// Cancellation signal and optional deadline for one executor invocation.
#[derive(Debug, Clone)]
pub struct RetryContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for RetryContext {
    fn default() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }
}

impl RetryContext {
    /// A context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Give up waiting at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Give up waiting `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Outcome of a failed [`execute`] call.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation failed permanently, or its last transient failure after
    /// retries ran out.
    #[error("{0}")]
    Operation(E),

    /// The cancellation token fired.
    #[error("cancelled while waiting to retry")]
    Cancelled,

    /// The deadline passed.
    #[error("deadline exceeded while waiting to retry")]
    DeadlineExceeded,
}

impl<E> RetryError<E> {
    /// The operation error, if the operation itself failed.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            RetryError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, runs out of retries,
/// or the context gives up.
pub async fn execute<T, E, F, Fut>(
    policy: &RetryPolicy,
    ctx: &RetryContext,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + Display,
{
    let mut attempt: u32 = 0;
    loop {
        if ctx.is_cancelled() {
            return Err(RetryError::Cancelled);
        }
        if ctx.deadline_passed() {
            return Err(RetryError::DeadlineExceeded);
        }

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.classify().is_transient() {
            debug!(attempt, error = %err, "Permanent error, not retrying");
            return Err(RetryError::Operation(err));
        }

        if attempt >= policy.max_retries {
            error!(
                attempts = attempt + 1,
                error = %err,
                "Retries exhausted"
            );
            return Err(RetryError::Operation(err));
        }

        let delay = policy.backoff(attempt);
        warn!(
            attempt = attempt + 1,
            max_retries = policy.max_retries,
            delay_ms = millis(delay),
            error = %err,
            "Transient error, retrying"
        );

        wait(ctx, delay).await?;
        attempt += 1;
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// Sleep for `delay` unless the context gives up first.
async fn wait<E>(ctx: &RetryContext, delay: Duration) -> Result<(), RetryError<E>> {
    let sleep = tokio::time::sleep(delay);
    match ctx.deadline {
        Some(deadline) => tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(RetryError::Cancelled),
            _ = tokio::time::sleep_until(deadline) => Err(RetryError::DeadlineExceeded),
            _ = sleep => Ok(()),
        },
        None => tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(RetryError::Cancelled),
            _ = sleep => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtcontrol_api::ApiError;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.initial_backoff, Duration::from_secs(1));
        assert_eq!(policy.multiplier, 4);
        assert_eq!(policy.max_backoff, Duration::from_secs(30));
        assert_eq!(policy.max_retries, 3);
    }

    #[test]
    fn test_millis_saturates() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_base_delay_grows_by_four_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay(0), Duration::from_secs(1));
        assert_eq!(policy.base_delay(1), Duration::from_secs(4));
        assert_eq!(policy.base_delay(2), Duration::from_secs(16));
        assert_eq!(policy.base_delay(3), Duration::from_secs(30));
    }

    #[test]
    fn test_base_delay_huge_attempt_saturates_to_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay(u32::MAX), Duration::from_secs(30));
        assert_eq!(policy.base_delay(1_000), Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_within_equal_jitter_bounds() {
        let policy = RetryPolicy::default();
        for attempt in 0..8 {
            let base = policy.base_delay(attempt);
            for _ in 0..200 {
                let wait = policy.backoff(attempt);
                assert!(wait >= base / 2, "attempt {} wait {:?}", attempt, wait);
                assert!(wait <= base, "attempt {} wait {:?}", attempt, wait);
            }
        }
    }

    #[test]
    fn test_backoff_after_cap_stays_between_15_and_30_seconds() {
        for attempt in [3, 4, 10, 64, u32::MAX] {
            let wait = backoff(attempt);
            assert!(wait >= Duration::from_secs(15));
            assert!(wait <= Duration::from_secs(30));
        }
    }

    #[test]
    fn test_zero_backoff_policy() {
        let policy = RetryPolicy::new().with_initial_backoff(Duration::ZERO);
        assert_eq!(policy.backoff(2), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_deadline_before_first_attempt() {
        let ctx = RetryContext::new().with_deadline(Instant::now());
        let result: Result<(), RetryError<ApiError>> =
            execute(&RetryPolicy::default(), &ctx, || async { Ok(()) }).await;
        assert!(matches!(result, Err(RetryError::DeadlineExceeded)));
    }
}

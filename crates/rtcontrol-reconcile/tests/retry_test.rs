// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Retry executor tests. Time is paused so backoff waits complete instantly
//! while still being measured.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rtcontrol_api::ApiError;
use rtcontrol_reconcile::{RetryContext, RetryError, RetryPolicy, execute};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Operation that fails with `errors` in order, then succeeds with the call count.
fn scripted(
    calls: Arc<AtomicUsize>,
    errors: Vec<ApiError>,
) -> impl FnMut() -> std::future::Ready<Result<usize, ApiError>> {
    let mut errors = errors.into_iter();
    move || {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        std::future::ready(match errors.next() {
            Some(err) => Err(err),
            None => Ok(n),
        })
    }
}

fn unavailable() -> ApiError {
    ApiError::server(503, "unavailable")
}

#[tokio::test(start_paused = true)]
async fn test_success_on_first_attempt() {
    let calls = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let result = execute(
        &RetryPolicy::default(),
        &RetryContext::new(),
        scripted(calls.clone(), vec![]),
    )
    .await;

    assert_eq!(result.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_two_transient_failures_then_success() {
    let calls = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let result = execute(
        &RetryPolicy::default(),
        &RetryContext::new(),
        scripted(calls.clone(), vec![unavailable(), ApiError::server(429, "slow down")]),
    )
    .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // Waits of [0.5s, 1s] and [2s, 4s].
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(2500), "{:?}", elapsed);
    assert!(elapsed <= Duration::from_secs(5), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_returns_last_error_after_four_attempts() {
    let calls = Arc::new(AtomicUsize::new(0));

    let result = execute(
        &RetryPolicy::default(),
        &RetryContext::new(),
        scripted(
            calls.clone(),
            vec![
                unavailable(),
                unavailable(),
                unavailable(),
                ApiError::server(500, "last one"),
                unavailable(),
            ],
        ),
    )
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    match result {
        Err(RetryError::Operation(err)) => {
            assert_eq!(err.status(), Some(500));
            assert!(err.to_string().contains("last one"));
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_permanent_error_is_returned_immediately() {
    let calls = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let result = execute(
        &RetryPolicy::default(),
        &RetryContext::new(),
        scripted(calls.clone(), vec![ApiError::server(404, "gone")]),
    )
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(matches!(result, Err(RetryError::Operation(e)) if e.is_not_found()));
}

#[tokio::test(start_paused = true)]
async fn test_no_retries_policy_makes_one_attempt() {
    let calls = Arc::new(AtomicUsize::new(0));

    let result = execute(
        &RetryPolicy::no_retries(),
        &RetryContext::new(),
        scripted(calls.clone(), vec![unavailable()]),
    )
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(result, Err(RetryError::Operation(_))));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_wait() {
    let calls = Arc::new(AtomicUsize::new(0));
    let token = CancellationToken::new();
    let ctx = RetryContext::new().with_cancellation(token.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let start = Instant::now();
    let result = execute(
        &RetryPolicy::default(),
        &ctx,
        scripted(calls.clone(), (0..4).map(|_| unavailable()).collect()),
    )
    .await;

    assert!(matches!(result, Err(RetryError::Cancelled)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_already_cancelled_makes_no_attempt() {
    let calls = Arc::new(AtomicUsize::new(0));
    let token = CancellationToken::new();
    token.cancel();

    let result = execute(
        &RetryPolicy::default(),
        &RetryContext::new().with_cancellation(token),
        scripted(calls.clone(), vec![]),
    )
    .await;

    assert!(matches!(result, Err(RetryError::Cancelled)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_ends_retries() {
    let calls = Arc::new(AtomicUsize::new(0));
    let ctx = RetryContext::new().with_timeout(Duration::from_secs(3));
    let start = Instant::now();

    let result = execute(
        &RetryPolicy::default(),
        &ctx,
        scripted(calls.clone(), (0..4).map(|_| unavailable()).collect()),
    )
    .await;

    assert!(matches!(result, Err(RetryError::DeadlineExceeded)));
    let attempts = calls.load(Ordering::SeqCst);
    assert!((2..=3).contains(&attempts), "attempts {}", attempts);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(3), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(3100), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_io_errors_are_classified() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let result: Result<(), RetryError<io::Error>> = execute(
        &RetryPolicy::default(),
        &RetryContext::new(),
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
                } else {
                    Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
                }
            }
        },
    )
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    match result {
        Err(RetryError::Operation(err)) => assert_eq!(err.kind(), io::ErrorKind::PermissionDenied),
        other => panic!("unexpected result {:?}", other),
    }
}

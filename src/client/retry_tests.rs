// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `retry.rs`

#[cfg(test)]
mod tests {
    use super::super::{
        http_backoff, is_retryable_http_status, retry_http_call, retry_http_call_when,
        ExponentialBackoff,
    };
    use crate::errors::ApiError;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn status_error(status: u16) -> ApiError {
        ApiError::UnexpectedStatus {
            method: "GET".to_string(),
            url: "https://api.test/http".to_string(),
            status,
            body: String::new(),
        }
    }

    fn fast_backoff() -> ExponentialBackoff {
        ExponentialBackoff::new(
            Duration::from_millis(1),
            Duration::from_millis(2),
            Some(Duration::from_secs(5)),
            2.0,
            0.0,
        )
    }

    /// Test that backoff configuration has expected values
    #[test]
    fn test_http_backoff_configuration() {
        let backoff = http_backoff();

        assert_eq!(backoff.initial_interval, Duration::from_millis(50));
        assert_eq!(backoff.max_interval, Duration::from_secs(10));
        assert_eq!(backoff.max_elapsed_time, Some(Duration::from_secs(120)));

        #[allow(clippy::float_cmp)]
        {
            assert_eq!(backoff.multiplier, 2.0);
            assert_eq!(backoff.randomization_factor, 0.1);
        }
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [429, 500, 502, 503, 504] {
            assert!(
                is_retryable_http_status(StatusCode::from_u16(status).unwrap()),
                "HTTP {status} should be retryable"
            );
        }
        for status in [400, 401, 403, 404, 409, 422, 501] {
            assert!(
                !is_retryable_http_status(StatusCode::from_u16(status).unwrap()),
                "HTTP {status} should not be retryable"
            );
        }
    }

    #[test]
    fn test_connection_errors_are_transient() {
        let err = ApiError::Connection {
            method: "GET".to_string(),
            url: "https://api.test/http".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.is_transient());
        assert!(!ApiError::InvalidResponse {
            url: "https://api.test/http".to_string(),
            reason: "expected value".to_string(),
        }
        .is_transient());
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let mut backoff = ExponentialBackoff::new(
            Duration::from_millis(100),
            Duration::from_millis(300),
            None,
            2.0,
            0.0,
        );

        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(300)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(300)));

        backoff.reset();
        assert_eq!(backoff.current_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let mut backoff = http_backoff();
        for _ in 0..20 {
            backoff.current_interval = Duration::from_millis(1000);
            let next = backoff.next_backoff().unwrap();
            assert!(next >= Duration::from_millis(900) && next <= Duration::from_millis(1100));
        }
    }

    #[test]
    fn test_exhausted_budget_stops() {
        let mut backoff = http_backoff().with_max_elapsed_time(Some(Duration::ZERO));
        assert_eq!(backoff.next_backoff(), None);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;

        let result = retry_http_call(
            fast_backoff(),
            move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(status_error(503))
                } else {
                    Ok("done")
                }
            },
            "list http checks",
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_fail_immediately() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;

        let result: Result<(), ApiError> = retry_http_call(
            fast_backoff(),
            move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(status_error(422))
            },
            "create http check",
        )
        .await;

        assert_eq!(result.unwrap_err().status(), Some(422));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_last_error_returned_when_exhausted() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;

        let result: Result<(), ApiError> = retry_http_call(
            fast_backoff().with_max_elapsed_time(Some(Duration::ZERO)),
            move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(status_error(429))
            },
            "list domains",
        )
        .await;

        assert_eq!(result.unwrap_err().status(), Some(429));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_budget_starts_with_the_call() {
        let backoff = fast_backoff().with_max_elapsed_time(Some(Duration::from_millis(100)));
        tokio::time::sleep(Duration::from_millis(150)).await;

        let counter = AtomicUsize::new(0);
        let attempts = &counter;

        let result = retry_http_call(
            backoff,
            move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(status_error(429))
                } else {
                    Ok("done")
                }
            },
            "list geoproximities",
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_custom_predicate_limits_retries() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;

        let result: Result<(), ApiError> = retry_http_call_when(
            fast_backoff(),
            move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(status_error(503))
            },
            "create http check",
            ApiError::is_rate_limited,
        )
        .await;

        assert_eq!(result.unwrap_err().status(), Some(503));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(status_error(429).is_rate_limited());
        assert!(!status_error(503).is_rate_limited());
    }
}

//! Bounded retry with exponential backoff for transient SQLite failures.

use std::thread;
use std::time::Duration;

use rusqlite::ErrorCode;

/// Retry settings for database operations.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        RetryPolicy {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based), capped at `max_backoff`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry as i32);
        let millis = self.initial_backoff.as_millis() as f64 * factor;
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Run `op`, retrying transient failures with backoff.
    pub fn run<T, F>(&self, op: F) -> rusqlite::Result<T>
    where
        F: FnMut() -> rusqlite::Result<T>,
    {
        self.run_with_sleep(op, thread::sleep)
    }

    pub(crate) fn run_with_sleep<T, F, S>(&self, mut op: F, mut sleep: S) -> rusqlite::Result<T>
    where
        F: FnMut() -> rusqlite::Result<T>,
        S: FnMut(Duration),
    {
        let attempts = self.max_attempts.max(1);
        let mut retry = 0;
        loop {
            match op() {
                Err(e) if is_transient(&e) && retry + 1 < attempts => {
                    let delay = self.backoff(retry);
                    tracing::debug!(
                        "transient database error ({}), retrying in {:?} ({}/{})",
                        e,
                        delay,
                        retry + 1,
                        attempts - 1
                    );
                    sleep(delay);
                    retry += 1;
                }
                result => return result,
            }
        }
    }
}

/// Busy, locked and cannot-open failures may clear up on their own.
pub fn is_transient(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn busy() -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_BUSY), None)
    }

    fn constraint() -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_CONSTRAINT), None)
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy {
            max_attempts: 6,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(500),
            multiplier: 2.0,
        };

        let delays: Vec<_> = (0..5).map(|i| policy.backoff(i).as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);
    }

    #[test]
    fn test_retries_transient_until_success() {
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let mut slept = Vec::new();

        let result = policy.run_with_sleep(
            || {
                calls += 1;
                if calls < 3 {
                    Err(busy())
                } else {
                    Ok(calls)
                }
            },
            |d| slept.push(d),
        );

        assert_eq!(result.unwrap(), 3);
        assert_eq!(slept, vec![policy.backoff(0), policy.backoff(1)]);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        };
        let mut calls = 0;

        let result: rusqlite::Result<()> = policy.run_with_sleep(
            || {
                calls += 1;
                Err(busy())
            },
            |_| {},
        );

        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_non_transient_is_not_retried() {
        let mut calls = 0;
        let result: rusqlite::Result<()> = RetryPolicy::default().run_with_sleep(
            || {
                calls += 1;
                Err(constraint())
            },
            |_| {},
        );

        assert!(result.is_err());
        assert_eq!(calls, 1);
        assert!(!is_transient(&constraint()));
        assert!(is_transient(&busy()));
    }
}

//! Retry harness (C5)
//!
//! Error-kind-blind retry with exponential backoff — with one exception:
//! `VaayuError::Interrupted` is a user-requested abort (Ctrl-C), not a
//! transient failure, and is never retried. This mirrors
//! `except Exception:` in the original Python transfer loop, which never
//! catches `KeyboardInterrupt` (a `BaseException`). Every other error kind
//! is retried identically; classification of what went wrong beyond that
//! is a display-layer concern (see `cli::classify`), not this harness's.

use crate::error::{Result, VaayuError};
use std::time::Duration;

const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Run `f` up to `retries + 1` times. Between attempts sleeps
/// `min(base_delay * 2^(attempt-1), 10s)`. Returns the last error if
/// every attempt fails. `VaayuError::Interrupted` aborts immediately,
/// without sleeping or consuming a retry.
pub fn retry<T>(retries: u32, base_delay: Duration, mut f: impl FnMut(u32) -> Result<T>) -> Result<T> {
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(value) => return Ok(value),
            Err(VaayuError::Interrupted) => return Err(VaayuError::Interrupted),
            Err(err) => {
                if attempt > retries {
                    return Err(err);
                }
                let delay = backoff_for(base_delay, attempt);
                tracing::debug!(attempt, ?delay, error = %err, "retrying after backoff");
                std::thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}

fn backoff_for(base_delay: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base_delay.saturating_mul(factor).min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VaayuError;
    use std::cell::Cell;

    #[test]
    fn succeeds_without_retrying_on_first_try() {
        let calls = Cell::new(0);
        let result = retry(3, Duration::from_millis(1), |_attempt| {
            calls.set(calls.get() + 1);
            Ok::<_, VaayuError>(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retries_until_success_within_budget() {
        let calls = Cell::new(0);
        let result = retry(3, Duration::from_millis(1), |_attempt| {
            let n = calls.get() + 1;
            calls.set(n);
            if n < 3 {
                Err(VaayuError::transfer("/tmp/x", "transient"))
            } else {
                Ok(n)
            }
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn exhausts_retries_and_surfaces_last_error() {
        let calls = Cell::new(0);
        let result = retry(2, Duration::from_millis(1), |_attempt| {
            calls.set(calls.get() + 1);
            Err::<(), _>(VaayuError::transfer("/tmp/x", "transient"))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn interrupted_aborts_immediately_without_retrying() {
        let calls = Cell::new(0);
        let result = retry(5, Duration::from_secs(10), |_attempt| {
            calls.set(calls.get() + 1);
            Err::<(), _>(VaayuError::Interrupted)
        });
        assert!(matches!(result, Err(VaayuError::Interrupted)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn backoff_caps_at_ten_seconds() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_for(base, 1), Duration::from_secs(1));
        assert_eq!(backoff_for(base, 2), Duration::from_secs(2));
        assert_eq!(backoff_for(base, 10), MAX_BACKOFF);
    }
}

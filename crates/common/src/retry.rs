//! Retry helpers.
//!
//! The spec calls for two distinct retry shapes: bounded retries with a
//! fixed attempt count (self-transfer prevout lookups, §4.1, retried
//! indefinitely with fixed back-off) and the submitter's "retryable
//! classification" loop, which re-attempts the same row forever until it
//! stops being retryable. Both reduce to the same primitive: sleep-then-
//! retry with a fixed delay, no cap. Contrast with the teacher's
//! `retry!`/`retry_tokio!` macros, which bound the attempt count — this
//! system never wants to give up on a transient error, so the bound is
//! dropped rather than inherited.

use std::time::Duration;

use tracing::warn;

/// Calls `f` until it returns `Ok`, sleeping `delay` between attempts and
/// logging each failure. Never gives up — callers that need a ceiling
/// should wrap this with their own `tokio::time::timeout` or attempt
/// counter.
pub async fn retry_indefinitely<T, E, F, Fut>(op_name: &str, delay: Duration, mut f: F) -> T
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    loop {
        match f().await {
            Ok(val) => return val,
            Err(err) => {
                warn!(op = op_name, err = %err, "retrying after transient failure");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// The fixed back-off window the spec names throughout §4/§7: "500ms-1s".
/// We use the low end as a single fixed delay rather than jittering within
/// the range — the range describes acceptable values, not a required
/// distribution.
pub const TRANSIENT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Back-off used when a settlement-tip gate isn't satisfied yet (§4.3).
pub const GATE_RECHECK_DELAY: Duration = Duration::from_secs(60);

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn retries_until_ok() {
        let attempts = AtomicUsize::new(0);
        let result = retry_indefinitely("test-op", Duration::from_millis(1), || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("not yet")
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}

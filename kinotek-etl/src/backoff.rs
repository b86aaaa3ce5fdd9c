//! Retry with exponential delay, shared by every fallible pipeline step.

use std::time::Duration;

use kinotek_core::{CatalogError, Result};
use tokio::sync::watch;
use tracing::warn;

/// Delay schedule: `min(cap, initial * factor^attempt)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub initial: Duration,
    pub factor: u32,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(100),
            factor: 2,
            cap: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.factor
            .checked_pow(attempt)
            .map(|multiplier| self.initial.saturating_mul(multiplier))
            .unwrap_or(self.cap)
            .min(self.cap)
    }
}

/// Runs `op` until it succeeds, sleeping between attempts. Only transient
/// errors retry; anything else propagates immediately. Each call starts at
/// attempt zero, so the schedule resets after a success.
///
/// Cancellation is honored between attempts, never inside `op`: a shutdown
/// signal interrupts the backoff sleep and surfaces as
/// [`CatalogError::Cancelled`].
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut shutdown: watch::Receiver<bool>,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                let delay = policy.delay(attempt);
                warn!(
                    "{} failed on attempt {}, retrying in {:?}: {}",
                    what, attempt, delay, e
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown.changed() => {
                        return Err(CatalogError::Cancelled(what.to_string()));
                    }
                }
                attempt = attempt.saturating_add(1);
            }
            Err(e) => return Err(e),
        }
    }
}

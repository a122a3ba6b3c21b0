//! Bounded retry with exponential backoff and jitter.
//!
//! One policy shared by the archive client and the ingestion sink, replacing
//! ad-hoc sleep loops. Nothing in the pipeline retries indefinitely.

use rand::Rng;
use std::time::Duration;

/// Bounded retry policy: `max_attempts` tries, exponential backoff from
/// `base_delay` with up to 25% random jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Backoff before retry number `attempt` (1-based): `base * 2^(attempt-1)`
    /// plus jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1));
        let jitter = exp.mul_f64(rand::thread_rng().gen_range(0.0..0.25));
        exp + jitter
    }

    /// Run `op`, retrying while `transient` says the error is worth another
    /// attempt. Returns the last error once the budget is exhausted.
    pub fn run<T, E, F, P>(&self, mut op: F, transient: P) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && transient(&e) => {
                    let delay = self.delay_for(attempt);
                    tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "transient failure, backing off");
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

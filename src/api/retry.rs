use std::future::Future;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;

use crate::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_MS, DEFAULT_RETRY_MAX_DELAY_MS, JITTER_FRACTION,
};
use crate::error::{GhSubError, GhSubResult};
use crate::logging::log_debug;

/// Backoff settings for one logical operation. The attempt counter is local
/// to each `run` call, so a policy value can be reused without one
/// operation's backoff state leaking into another's.
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
    pub deadline: Option<Instant>,
    rng: StdRng,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            deadline: None,
            rng: StdRng::from_entropy(),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic jitter for reproducible timing tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            ..Self::default()
        }
    }

    pub fn base_delay(mut self, base: Duration) -> Self {
        self.base_delay = base;
        self
    }

    pub fn max_delay(mut self, max: Duration) -> Self {
        self.max_delay = max;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Run `op`, retrying transient failures with capped exponential backoff.
    /// Permanent failures propagate immediately. A server wait hint overrides
    /// the computed delay for that attempt. Exhausting the attempt ceiling
    /// yields `RetryExhausted`; a delay that would cross the deadline yields
    /// `DeadlineExceeded` instead of sleeping past it.
    pub async fn run<T, F, Fut>(&mut self, mut op: F) -> GhSubResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = GhSubResult<T>>,
    {
        let mut attempt: u32 = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(GhSubError::RetryExhausted {
                            attempts: attempt,
                            last_error: err.to_string(),
                        });
                    }

                    let delay = match err.retry_hint() {
                        Some(hint) => hint,
                        None => self.backoff_delay(attempt),
                    };

                    if let Some(deadline) = self.deadline {
                        if Instant::now() + delay > deadline {
                            return Err(GhSubError::DeadlineExceeded);
                        }
                    }

                    log_debug(&format!(
                        "transient failure (attempt {}/{}), retrying in {:?}: {}",
                        attempt, self.max_attempts, delay, err
                    ));
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// `base * 2^(attempt-1)`, capped, with up to ±20% jitter.
    fn backoff_delay(&mut self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let raw = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);
        let factor = self
            .rng
            .gen_range((1.0 - JITTER_FRACTION)..=(1.0 + JITTER_FRACTION));
        raw.mul_f64(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn transient() -> GhSubError {
        GhSubError::RateLimited { retry_after: None }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_then_success() {
        let mut policy = RetryPolicy::with_seed(7).base_delay(Duration::from_millis(100));
        let calls = Cell::new(0u32);
        let stamps: RefCell<Vec<Instant>> = RefCell::new(Vec::new());

        let result = policy
            .run(|| {
                stamps.borrow_mut().push(Instant::now());
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n <= 2 {
                        Err(transient())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);

        let stamps = stamps.borrow();
        let first_delay = stamps[1] - stamps[0];
        let second_delay = stamps[2] - stamps[1];
        // 100ms and 200ms bases, each within ±20% jitter.
        assert!(first_delay >= Duration::from_millis(80) && first_delay <= Duration::from_millis(120));
        assert!(second_delay >= Duration::from_millis(160) && second_delay <= Duration::from_millis(240));
        assert!(second_delay > first_delay);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_hint_overrides_computed_backoff() {
        let mut policy = RetryPolicy::with_seed(1).base_delay(Duration::from_millis(100));
        let calls = Cell::new(0u32);
        let stamps: RefCell<Vec<Instant>> = RefCell::new(Vec::new());

        let result = policy
            .run(|| {
                stamps.borrow_mut().push(Instant::now());
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n == 1 {
                        Err(GhSubError::RateLimited {
                            retry_after: Some(5),
                        })
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        let stamps = stamps.borrow();
        // The hinted 5s exactly, not the jittered exponential value.
        assert_eq!(stamps[1] - stamps[0], Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_is_not_retried() {
        let mut policy = RetryPolicy::with_seed(3);
        let calls = Cell::new(0u32);

        let result: GhSubResult<()> = policy
            .run(|| {
                calls.set(calls.get() + 1);
                async move {
                    Err(GhSubError::InvalidInput("bad field".to_string()))
                }
            })
            .await;

        assert!(matches!(result, Err(GhSubError::InvalidInput(_))));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_is_a_typed_error() {
        let mut policy = RetryPolicy::with_seed(9)
            .base_delay(Duration::from_millis(10))
            .max_attempts(4);
        let calls = Cell::new(0u32);

        let result: GhSubResult<()> = policy
            .run(|| {
                calls.set(calls.get() + 1);
                async move { Err(transient()) }
            })
            .await;

        match result {
            Err(GhSubError::RetryExhausted { attempts, .. }) => assert_eq!(attempts, 4),
            other => panic!("Expected RetryExhausted, got {:?}", other),
        }
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_aborts_instead_of_sleeping_past_it() {
        let mut policy = RetryPolicy::with_seed(5)
            .base_delay(Duration::from_millis(500))
            .deadline(Instant::now() + Duration::from_millis(100));
        let calls = Cell::new(0u32);

        let result: GhSubResult<()> = policy
            .run(|| {
                calls.set(calls.get() + 1);
                async move { Err(transient()) }
            })
            .await;

        assert!(matches!(result, Err(GhSubError::DeadlineExceeded)));
        // First attempt ran; the 400-600ms backoff would cross the deadline.
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_caps_at_max_delay() {
        let mut policy = RetryPolicy::with_seed(11)
            .base_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(150))
            .max_attempts(4);
        let stamps: RefCell<Vec<Instant>> = RefCell::new(Vec::new());

        let _: GhSubResult<()> = policy
            .run(|| {
                stamps.borrow_mut().push(Instant::now());
                async move { Err(transient()) }
            })
            .await;

        let stamps = stamps.borrow();
        for pair in stamps.windows(2).skip(1) {
            let delay = pair[1] - pair[0];
            // Capped at 150ms plus jitter headroom.
            assert!(delay <= Duration::from_millis(180));
        }
    }
}

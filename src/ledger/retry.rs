//! Exponential backoff for leaderboard reads

use std::cell::RefCell;
use std::future::Future;

use crate::error::LedgerError;

/// Delay schedule: `initial_ms` doubling per attempt, capped at `max_ms`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub initial_ms: f64,
    pub max_ms: f64,
    /// Total tries including the first
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_ms: 1000.0,
            max_ms: 30_000.0,
            max_attempts: 4,
        }
    }
}

impl Backoff {
    /// Wait before retry number `retry` (0 = first retry)
    pub fn delay(&self, retry: u32) -> f64 {
        (self.initial_ms * 2f64.powi(retry.min(30) as i32)).min(self.max_ms)
    }
}

/// Suspends the current task for a while
#[allow(async_fn_in_trait)]
pub trait Sleeper {
    async fn sleep(&self, ms: f64);
}

impl<S: Sleeper> Sleeper for std::rc::Rc<S> {
    async fn sleep(&self, ms: f64) {
        (**self).sleep(ms).await
    }
}

/// Blocks the thread; only for the headless native run
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

#[cfg(not(target_arch = "wasm32"))]
impl Sleeper for ThreadSleeper {
    async fn sleep(&self, ms: f64) {
        std::thread::sleep(std::time::Duration::from_secs_f64(ms.max(0.0) / 1000.0));
    }
}

/// `setTimeout` wrapped in a promise
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeoutSleeper;

#[cfg(target_arch = "wasm32")]
impl Sleeper for TimeoutSleeper {
    async fn sleep(&self, ms: f64) {
        let promise = js_sys::Promise::new(&mut |resolve, reject| {
            let scheduled = web_sys::window()
                .ok_or_else(|| wasm_bindgen::JsValue::from_str("no window"))
                .and_then(|w| w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32));
            if let Err(e) = scheduled {
                // Reject so the await below still settles
                if let Err(e) = reject.call1(&wasm_bindgen::JsValue::NULL, &e) {
                    log::warn!("Could not settle sleep: {:?}", e);
                }
            }
        });
        if let Err(e) = wasm_bindgen_futures::JsFuture::from(promise).await {
            log::warn!("setTimeout unavailable, not sleeping: {:?}", e);
        }
    }
}

/// Returns immediately and remembers what was asked
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: RefCell<Vec<f64>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slept(&self) -> Vec<f64> {
        self.slept.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, ms: f64) {
        self.slept.borrow_mut().push(ms);
    }
}

/// Run `op` until it succeeds, fails permanently, or runs out of attempts.
/// Only transient errors are retried.
pub async fn retry<T, F, Fut>(backoff: Backoff, sleeper: &impl Sleeper, mut op: F) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt + 1 < backoff.max_attempts => {
                let delay = backoff.delay(attempt);
                log::warn!("Ledger request failed ({}); retrying in {} ms", e, delay);
                sleeper.sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_delays_double_then_cap() {
        let backoff = Backoff::default();
        let delays: Vec<f64> = (0..7).map(|i| backoff.delay(i)).collect();
        assert_eq!(delays, vec![1000.0, 2000.0, 4000.0, 8000.0, 16000.0, 30000.0, 30000.0]);
        assert_eq!(backoff.delay(u32::MAX), 30000.0);
    }

    #[test]
    fn test_retries_transient_until_success() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);
        let result = pollster::block_on(retry(Backoff::default(), &sleeper, || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(LedgerError::Network("down".into()))
                } else {
                    Ok(n)
                }
            }
        }));
        assert_eq!(result, Ok(3));
        assert_eq!(sleeper.slept(), vec![1000.0, 2000.0]);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);
        let result: Result<(), _> = pollster::block_on(retry(Backoff::default(), &sleeper, || {
            calls.set(calls.get() + 1);
            async { Err(LedgerError::InvalidResponse("garbled".into())) }
        }));
        assert!(result.is_err());
        assert_eq!(calls.get(), 4);
        assert_eq!(sleeper.slept(), vec![1000.0, 2000.0, 4000.0]);
    }

    #[test]
    fn test_thread_sleeper_blocks_for_the_delay() {
        let start = std::time::Instant::now();
        pollster::block_on(ThreadSleeper.sleep(5.0));
        assert!(start.elapsed() >= std::time::Duration::from_millis(5));
        // Negative delays do not panic
        pollster::block_on(ThreadSleeper.sleep(-1.0));
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);
        let result: Result<(), _> = pollster::block_on(retry(Backoff::default(), &sleeper, || {
            calls.set(calls.get() + 1);
            async { Err(LedgerError::Rejected("Game not registered".into())) }
        }));
        assert_eq!(result, Err(LedgerError::Rejected("Game not registered".into())));
        assert_eq!(calls.get(), 1);
        assert!(sleeper.slept().is_empty());
    }
}

// file: src/redaction/throttle.rs
// description: minimum-spacing pacer shared by every oracle caller
// reference: async mutex guarded slot tracking

use crate::config::ThrottleConfig;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

/// Callers queue on the mutex, so dispatches leave in order and never closer than `min_interval`.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.inter_call_delay())
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub async fn await_slot(&self) {
        let mut next_slot = self.next_slot.lock().await;

        if let Some(at) = *next_slot
            && at > Instant::now()
        {
            debug!(
                "Waiting {}ms for the next oracle slot",
                (at - Instant::now()).as_millis()
            );
            sleep_until(at).await;
        }

        *next_slot = Some(Instant::now() + self.min_interval);
    }

    /// Pushes the next slot at least `delay` into the future.
    pub async fn defer(&self, delay: Duration) {
        let mut next_slot = self.next_slot.lock().await;
        let candidate = Instant::now() + delay;
        *next_slot = Some(match *next_slot {
            Some(at) if at > candidate => at,
            _ => candidate,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_spacing_between_calls() {
        let throttle = Throttle::new(Duration::from_millis(500));

        throttle.await_slot().await;
        let first = Instant::now();
        throttle.await_slot().await;
        let second = Instant::now();

        assert!(second - first >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_immediate() {
        let throttle = Throttle::new(Duration::from_secs(5));
        let start = Instant::now();
        throttle.await_slot().await;
        assert_eq!(Instant::now() - start, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_across_tasks() {
        let throttle = Arc::new(Throttle::new(Duration::from_millis(200)));
        let mut handles = Vec::new();

        for _ in 0..4 {
            let throttle = throttle.clone();
            handles.push(tokio::spawn(async move {
                throttle.await_slot().await;
                Instant::now()
            }));
        }

        let mut dispatched = Vec::new();
        for handle in handles {
            dispatched.push(handle.await.unwrap());
        }
        dispatched.sort();

        for pair in dispatched.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(200));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_defer_pushes_next_slot() {
        let throttle = Throttle::new(Duration::from_millis(100));
        throttle.await_slot().await;
        let start = Instant::now();

        throttle.defer(Duration::from_secs(2)).await;
        throttle.await_slot().await;

        assert!(Instant::now() - start >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_never_waits() {
        let throttle = Throttle::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..5 {
            throttle.await_slot().await;
        }
        assert_eq!(Instant::now() - start, Duration::ZERO);
    }
}

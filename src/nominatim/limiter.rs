//! Minimum-interval gate in front of every upstream dispatch.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Serializes dispatches so that consecutive starts are at least
/// `min_interval` apart, across every task sharing this limiter.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// Start of the most recent dispatch. The guard is held across the wait,
    /// so read, sleep and write form one critical section.
    last_request: Mutex<Option<Instant>>,
    /// Copy of the mark for readers; never held across an await.
    last_dispatch: parking_lot::Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
            last_dispatch: parking_lot::Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a dispatch is allowed, then record it.
    ///
    /// Cancel-safe: dropping the future mid-wait releases the lock without
    /// touching the mark.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                debug!(
                    "Rate limiter waiting {:?}",
                    ready_at.saturating_duration_since(Instant::now())
                );
                sleep_until(ready_at).await;
            }
        }
        let now = Instant::now();
        *last = Some(now);
        *self.last_dispatch.lock() = Some(now);
    }

    /// Time since the last recorded dispatch. Does not wait for callers
    /// queued in `acquire`.
    pub fn since_last_dispatch(&self) -> Option<Duration> {
        self.last_dispatch.lock().map(|t| t.elapsed())
    }
}

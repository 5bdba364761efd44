use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Process-wide gate spacing outbound calls at least `delay` apart.
///
/// Callers reserve the next free slot under the lock and sleep outside it, so
/// concurrent callers are served one `delay` apart in reservation order.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.delay);
            slot
        };

        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limited, waiting for slot");
            tokio::time::sleep_until(slot).await;
        }
    }
}

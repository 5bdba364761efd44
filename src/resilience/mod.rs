//! Cross-cutting policies composed around every outbound extractor call.

use std::future::Future;

pub mod ratelimit;
pub mod retry;

pub use ratelimit::RateLimiter;
pub use retry::RetryPolicy;

/// Global spacing plus bounded retries. Every attempt, including retries,
/// waits for its own rate-limit slot.
#[derive(Debug)]
pub struct Resilience {
    pub limiter: RateLimiter,
    pub retry: RetryPolicy,
}

impl Resilience {
    pub fn new(limiter: RateLimiter, retry: RetryPolicy) -> Self {
        Self { limiter, retry }
    }

    pub async fn call<T, E, F, Fut, P>(&self, mut op: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
    {
        let limiter = &self.limiter;
        self.retry
            .run_if(
                || {
                    let attempt = op();
                    async move {
                        limiter.acquire().await;
                        attempt.await
                    }
                },
                should_retry,
            )
            .await
    }
}

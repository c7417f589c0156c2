use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64, // tokens per second
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, refill_rate: f64) -> Self {
        Self {
            tokens: capacity,
            capacity,
            refill_rate,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        let tokens_to_add = elapsed * self.refill_rate;

        self.tokens = (self.tokens + tokens_to_add).min(self.capacity);
        self.last_refill = now;
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_next_token(&self) -> Duration {
        if self.tokens >= 1.0 {
            Duration::from_secs(0)
        } else {
            let tokens_needed = 1.0 - self.tokens;
            let seconds = tokens_needed / self.refill_rate;
            Duration::from_secs_f64(seconds.max(0.0))
        }
    }
}

/// Token-bucket limiter for one outbound dependency.
///
/// Clones share the same bucket, so every holder of a clone is throttled together
/// regardless of how many tasks call it concurrently.
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<Mutex<TokenBucket>>,
}

impl RateLimiter {
    /// Allow `rate_per_second` calls per second with bursts up to `burst`.
    pub fn new(rate_per_second: f64, burst: f64) -> Self {
        Self {
            bucket: Arc::new(Mutex::new(TokenBucket::new(burst.max(1.0), rate_per_second))),
        }
    }

    /// Enforce a minimum spacing between consecutive calls (no bursts).
    pub fn min_interval(interval: Duration) -> Self {
        let secs = interval.as_secs_f64();
        if secs <= 0.0 {
            return Self::new(f64::MAX, 1.0);
        }
        Self::new(1.0 / secs, 1.0)
    }

    /// Acquire a token, sleeping until one is available.
    pub async fn acquire(&self) {
        loop {
            let wait_duration = {
                let mut bucket = self.bucket.lock().await;
                if bucket.try_acquire() {
                    tracing::trace!(tokens_remaining = bucket.tokens, "Rate limit token acquired");
                    return;
                }
                bucket.time_until_next_token()
            };

            tracing::debug!(
                wait_ms = wait_duration.as_millis() as u64,
                "Rate limit reached, waiting for next token"
            );
            tokio::time::sleep(wait_duration).await;
        }
    }
}

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// A per-provider minimum-interval gate. Not a classic leaky bucket —
/// providers in this domain (§6) are specified by a minimum request
/// interval, not a burst-capacity rate, so this tracks only "earliest
/// time the next call may start" and sleeps callers up to it.
pub struct TokenBucket {
    min_interval: Duration,
    next_allowed_at: Mutex<Instant>,
    /// Nanoseconds since bucket creation the last permit was issued at;
    /// exposed for tests that want a cheap, lock-free read.
    issued_count: AtomicI64,
}

impl TokenBucket {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_allowed_at: Mutex::new(Instant::now()),
            issued_count: AtomicI64::new(0),
        }
    }

    /// Block until the next call is allowed, then reserve the following
    /// slot. Serializes all calls through this bucket.
    pub async fn acquire(&self) {
        let mut next = self.next_allowed_at.lock().await;
        let now = Instant::now();
        if *next > now {
            tokio::time::sleep(*next - now).await;
        }
        *next = Instant::now() + self.min_interval;
        self.issued_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn issued_count(&self) -> i64 {
        self.issued_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serializes_calls_with_minimum_spacing() {
        let bucket = TokenBucket::new(Duration::from_millis(20));
        let start = Instant::now();
        bucket.acquire().await;
        bucket.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(bucket.issued_count(), 2);
    }
}

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A token bucket refilled once per second (§5 backpressure). Deliberately
/// simple: one bucket per client instance, shared across every call made
/// through it.
pub struct RateLimiter {
    capacity: u32,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn per_second(capacity: u32) -> Self {
        Self {
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().unwrap();
                let elapsed = state.last_refill.elapsed();
                if elapsed >= Duration::from_secs(1) {
                    state.tokens = self.capacity;
                    state.last_refill = Instant::now();
                }

                if state.tokens > 0 {
                    state.tokens -= 1;
                    None
                } else {
                    Some(Duration::from_secs(1) - elapsed)
                }
            };

            match wait {
                None => return,
                Some(duration) => tokio::time::sleep(duration).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_capacity_calls_without_waiting() {
        let limiter = RateLimiter::per_second(5);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}

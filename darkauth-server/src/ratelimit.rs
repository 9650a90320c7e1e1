//! In-memory sliding-window rate limiter for authentication attempts.
//! Single-process only; a multi-instance deployment would need this backed
//! by something shared (Redis, Postgres), but one process is all the
//! installation story here supports.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::ApiError;

pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Vec<Instant>>>,
    max_attempts: u32,
    window: Duration,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_attempts", &self.max_attempts)
            .field("window", &self.window)
            .finish()
    }
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window_seconds: u64) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            max_attempts,
            window: Duration::from_secs(window_seconds),
        }
    }

    /// Records an attempt for `key` and returns an error if the bucket is
    /// already saturated. `key` should identify the actor, e.g.
    /// `"login:{email}"` or `"login_ip:{addr}"`.
    pub fn check(&self, key: &str) -> Result<(), ApiError> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock();
        let entry = buckets.entry(key.to_string()).or_default();
        entry.retain(|t| now.duration_since(*t) < self.window);

        if entry.len() as u32 >= self.max_attempts {
            let oldest = entry.first().copied().unwrap_or(now);
            let retry_after = self.window.saturating_sub(now.duration_since(oldest));
            return Err(ApiError::RateLimited {
                retry_after_seconds: retry_after.as_secs().max(1),
            });
        }

        entry.push(now);
        Ok(())
    }

    /// Clears the bucket for `key`, used after a successful login so the
    /// next failed attempt doesn't inherit exhausted budget from earlier
    /// unrelated failures.
    pub fn reset(&self, key: &str) {
        self.buckets.lock().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_attempts_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new(3, 60);
        for _ in 0..3 {
            assert!(limiter.check("k").is_ok());
        }
        assert!(limiter.check("k").is_err());
    }

    #[test]
    fn reset_clears_the_bucket() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.check("k").is_ok());
        assert!(limiter.check("k").is_err());
        limiter.reset("k");
        assert!(limiter.check("k").is_ok());
    }

    #[test]
    fn buckets_are_independent_per_key() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("b").is_ok());
    }
}

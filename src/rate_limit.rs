use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::tier::Tier;

/// Per-user sliding-window limiter for AI generation requests. Limits come
/// from the user's tier at check time, so an upgrade takes effect on the
/// next request.
pub struct GenerationRateLimiter {
    /// user_id -> (count, window_start)
    entries: DashMap<Uuid, (u32, Instant)>,
}

impl GenerationRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if a request is allowed. Returns Ok(remaining) or Err with
    /// retry-after seconds.
    pub fn check(&self, user_id: Uuid, tier: Tier) -> Result<u32, u64> {
        let features = tier.features();
        let limit = features.rate_limit_requests;
        let window = Duration::from_secs(features.rate_limit_window_secs);
        let now = Instant::now();

        let mut entry = self.entries.entry(user_id).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
            return Ok(limit.saturating_sub(1));
        }

        if *count >= limit {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(features.rate_limit_window_secs.saturating_sub(elapsed));
        }

        *count += 1;
        Ok(limit - *count)
    }

    /// Remove stale entries older than the given duration.
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}

impl Default for GenerationRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-email login brute force limiter.
pub struct LoginRateLimiter {
    /// email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if login attempt is allowed. 5 failures per 15 minutes.
    /// Does NOT increment the counter — call `record_failure()` on invalid password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        let window = Duration::from_secs(15 * 60);
        let now = Instant::now();

        let entry = self.entries.get(&email.to_lowercase());
        let Some(entry) = entry else {
            return Ok(());
        };

        let (count, start) = entry.value();

        if now.duration_since(*start) > window {
            return Ok(());
        }

        if *count >= 5 {
            let elapsed = now.duration_since(*start).as_secs();
            return Err((15 * 60u64).saturating_sub(elapsed));
        }

        Ok(())
    }

    /// Record a failed login attempt. Increments the counter for the given email.
    pub fn record_failure(&self, email: &str) {
        let window = Duration::from_secs(15 * 60);
        let now = Instant::now();

        let mut entry = self.entries.entry(email.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_limit_trips_at_ten() {
        let limiter = GenerationRateLimiter::new();
        let user = Uuid::now_v7();

        for _ in 0..10 {
            assert!(limiter.check(user, Tier::Free).is_ok());
        }
        assert!(limiter.check(user, Tier::Free).is_err());
    }

    #[test]
    fn users_are_isolated() {
        let limiter = GenerationRateLimiter::new();
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        for _ in 0..10 {
            limiter.check(a, Tier::Free).unwrap();
        }
        assert!(limiter.check(a, Tier::Free).is_err());
        assert!(limiter.check(b, Tier::Free).is_ok());
    }

    #[test]
    fn login_limiter_counts_failures_only() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..4 {
            limiter.record_failure("USER@example.com");
        }
        assert!(limiter.check("user@example.com").is_ok());
        limiter.record_failure("user@example.com");
        assert!(limiter.check("user@example.com").is_err());
    }
}

use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{Timelike, Utc};

/// Rotating pool of generation API credentials. Keys are scored on success
/// rate, recency and observed latency; quota-exhausted keys are parked
/// until the provider's daily reset.
pub struct KeyPool {
    inner: Mutex<Vec<KeyState>>,
}

struct KeyState {
    key: String,
    total: u64,
    successes: u64,
    errors: u32,
    avg_response_ms: u64,
    last_used: Option<Instant>,
    parked_until: Option<Instant>,
}

#[derive(Debug, PartialEq)]
pub enum PoolError {
    NoKeysConfigured,
    AllExhausted,
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolError::NoKeysConfigured => write!(f, "No generation API keys configured"),
            PoolError::AllExhausted => write!(f, "All generation API keys have exhausted their quota"),
        }
    }
}

impl KeyPool {
    pub fn new(keys: Vec<String>) -> Self {
        let states = keys
            .into_iter()
            .map(|key| KeyState {
                key,
                total: 0,
                successes: 0,
                errors: 0,
                avg_response_ms: 5_000,
                last_used: None,
                parked_until: None,
            })
            .collect();
        Self {
            inner: Mutex::new(states),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("key pool poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pick the best available key and mark it used.
    pub fn select_best(&self) -> Result<String, PoolError> {
        let mut states = self.inner.lock().expect("key pool poisoned");
        if states.is_empty() {
            return Err(PoolError::NoKeysConfigured);
        }

        let now = Instant::now();
        let best = states
            .iter_mut()
            .filter(|s| s.parked_until.is_none_or(|until| until <= now))
            .max_by(|a, b| {
                a.score()
                    .partial_cmp(&b.score())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        match best {
            Some(state) => {
                state.last_used = Some(now);
                Ok(state.key.clone())
            }
            None => Err(PoolError::AllExhausted),
        }
    }

    /// Keys not yet tried for the current task, worst last.
    pub fn fallback_keys(&self, exclude: &str) -> Vec<String> {
        let states = self.inner.lock().expect("key pool poisoned");
        let now = Instant::now();
        let mut candidates: Vec<(f64, String)> = states
            .iter()
            .filter(|s| s.key != exclude && s.parked_until.is_none_or(|until| until <= now))
            .map(|s| (s.score(), s.key.clone()))
            .collect();
        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        candidates.into_iter().map(|(_, key)| key).collect()
    }

    pub fn record_success(&self, key: &str, elapsed_ms: u64) {
        let mut states = self.inner.lock().expect("key pool poisoned");
        if let Some(state) = states.iter_mut().find(|s| s.key == key) {
            state.total += 1;
            state.successes += 1;
            state.avg_response_ms = (state.avg_response_ms * 7 + elapsed_ms * 3) / 10;
        }
    }

    pub fn record_failure(&self, key: &str, quota_exhausted: bool) {
        let mut states = self.inner.lock().expect("key pool poisoned");
        if let Some(state) = states.iter_mut().find(|s| s.key == key) {
            state.total += 1;
            state.errors += 1;
            if quota_exhausted {
                state.parked_until = Some(Instant::now() + until_daily_reset());
            }
        }
    }

    /// Unpark keys whose quota window has reset. Maintenance sweep hook.
    pub fn reset_expired_parks(&self) {
        let mut states = self.inner.lock().expect("key pool poisoned");
        let now = Instant::now();
        for state in states.iter_mut() {
            if state.parked_until.is_some_and(|until| until <= now) {
                state.parked_until = None;
                state.errors = 0;
            }
        }
    }
}

impl KeyState {
    fn score(&self) -> f64 {
        let success_rate = if self.total > 0 {
            self.successes as f64 / self.total as f64
        } else {
            1.0
        };

        // Prefer keys that succeed, respond fast, and were not just used.
        let speed = 1.0 - (self.avg_response_ms.min(30_000) as f64 / 30_000.0);
        let idle = match self.last_used {
            Some(at) if at.elapsed() < Duration::from_secs(1) => 0.0,
            _ => 1.0,
        };
        success_rate * 0.6 + speed * 0.2 + idle * 0.2
    }
}

fn until_daily_reset() -> Duration {
    let now = Utc::now();
    let secs_today = now.num_seconds_from_midnight() as u64;
    Duration::from_secs(24 * 60 * 60 - secs_today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pool_errors() {
        let pool = KeyPool::new(vec![]);
        assert_eq!(pool.select_best().unwrap_err(), PoolError::NoKeysConfigured);
    }

    #[test]
    fn failing_key_loses_to_healthy_key() {
        let pool = KeyPool::new(vec!["bad".to_string(), "good".to_string()]);
        for _ in 0..5 {
            pool.record_failure("bad", false);
            pool.record_success("good", 1_000);
        }
        assert_eq!(pool.select_best().unwrap(), "good");
    }

    #[test]
    fn quota_exhausted_keys_are_parked() {
        let pool = KeyPool::new(vec!["only".to_string()]);
        pool.record_failure("only", true);
        assert_eq!(pool.select_best().unwrap_err(), PoolError::AllExhausted);
    }

    #[test]
    fn fallback_excludes_selected() {
        let pool = KeyPool::new(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        let first = pool.select_best().unwrap();
        let rest = pool.fallback_keys(&first);
        assert_eq!(rest.len(), 2);
        assert!(!rest.contains(&first));
    }
}

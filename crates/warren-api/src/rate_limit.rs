//! Request throttling for the CLI bootstrap endpoint.
//!
//! The limiter is a trait on the application state rather than a
//! middleware layer, so tests and alternative deployments can swap
//! the policy without rebuilding the router. The default policy is a
//! process-local fixed window; counts reset on restart and are not
//! shared between replicas.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The request may proceed.
    Allowed {
        /// Requests left in the current window.
        remaining: u32,
    },
    /// The request is over the limit.
    Limited {
        /// Time until the window resets.
        retry_after: Duration,
    },
}

/// Per-key request throttle.
pub trait RateLimiter: Send + Sync {
    /// Check and count one request for `key`.
    fn allow(&self, key: &str) -> RateDecision;
}

struct Window {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window limiter: at most `limit` requests per `window` per key.
pub struct FixedWindowLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    /// Limiter allowing `limit` requests per `window`.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn allow_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock();

        // Expired windows are dead weight; dropping them here keeps the
        // map from accumulating one entry per forged bearer value.
        windows.retain(|_, w| now < w.reset_at);

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + self.window,
        });

        if entry.count < self.limit {
            entry.count += 1;
            RateDecision::Allowed {
                remaining: self.limit - entry.count,
            }
        } else {
            RateDecision::Limited {
                retry_after: entry.reset_at.saturating_duration_since(now),
            }
        }
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn allow(&self, key: &str) -> RateDecision {
        self.allow_at(key, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixth_request_in_window_is_limited() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(60));
        let t0 = Instant::now();

        for _ in 0..5 {
            assert!(matches!(
                limiter.allow_at("key-1", t0),
                RateDecision::Allowed { .. }
            ));
        }
        match limiter.allow_at("key-1", t0) {
            RateDecision::Limited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(60));
            }
            other => panic!("expected Limited, got {other:?}"),
        }
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(60));
        let t0 = Instant::now();

        for _ in 0..6 {
            limiter.allow_at("key-1", t0);
        }
        let later = t0 + Duration::from_secs(61);
        assert_eq!(
            limiter.allow_at("key-1", later),
            RateDecision::Allowed { remaining: 4 }
        );
    }

    #[test]
    fn expired_windows_are_evicted() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_secs(60));
        let t0 = Instant::now();

        for key in ["key-a", "key-b", "key-c"] {
            limiter.allow_at(key, t0);
        }
        assert_eq!(limiter.windows.lock().len(), 3);

        let later = t0 + Duration::from_secs(61);
        limiter.allow_at("key-d", later);
        assert_eq!(limiter.windows.lock().len(), 1);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let t0 = Instant::now();

        limiter.allow_at("key-1", t0);
        assert!(matches!(
            limiter.allow_at("key-1", t0),
            RateDecision::Limited { .. }
        ));
        assert!(matches!(
            limiter.allow_at("key-2", t0),
            RateDecision::Allowed { .. }
        ));
    }
}

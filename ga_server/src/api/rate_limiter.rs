//! Sliding-window rate limiting for login attempts.
//!
//! Each key (a username) gets its own window so one account being hammered
//! does not lock out everyone else.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rate limiter using a sliding window algorithm
#[derive(Debug)]
pub struct RateLimiter {
    /// Timestamps of recent requests
    timestamps: VecDeque<Instant>,
    /// Maximum number of requests allowed in the window
    max_requests: usize,
    /// Time window for rate limiting
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Example
    ///
    /// ```
    /// use ga_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// // Allow 5 attempts per minute
    /// let limiter = RateLimiter::new(5, Duration::from_secs(60));
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// Check if a request should be allowed
    ///
    /// Returns `true` if the request is allowed, `false` if rate limit exceeded.
    ///
    /// ```
    /// # use ga_server::api::rate_limiter::RateLimiter;
    /// # use std::time::Duration;
    /// let mut limiter = RateLimiter::new(5, Duration::from_secs(1));
    ///
    /// for _ in 0..5 {
    ///     assert!(limiter.check());
    /// }
    /// assert!(!limiter.check());
    /// ```
    pub fn check(&mut self) -> bool {
        self.check_at(Instant::now())
    }

    fn check_at(&mut self, now: Instant) -> bool {
        self.evict(now);

        if self.timestamps.len() >= self.max_requests {
            return false;
        }

        self.timestamps.push_back(now);
        true
    }

    /// Drop timestamps that fell out of the window
    fn evict(&mut self, now: Instant) {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Get the number of remaining requests allowed in the current window
    pub fn remaining(&self) -> usize {
        self.max_requests.saturating_sub(self.timestamps.len())
    }

    /// Get the time until the window resets (when the oldest request expires)
    ///
    /// Returns `None` if there are no requests in the current window.
    pub fn reset_in(&self) -> Option<Duration> {
        self.timestamps.front().map(|oldest| {
            let elapsed = Instant::now().duration_since(*oldest);
            self.window.saturating_sub(elapsed)
        })
    }
}

/// One [`RateLimiter`] per key
#[derive(Debug)]
pub struct KeyedRateLimiter {
    limiters: Mutex<HashMap<String, RateLimiter>>,
    max_requests: usize,
    window: Duration,
}

impl KeyedRateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            limiters: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Five attempts per minute, the limit on the login endpoints
    pub fn login() -> Self {
        Self::new(5, Duration::from_secs(60))
    }

    /// Record an attempt for `key`; `false` once the key is over its limit
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut limiters = self.limiters.lock().unwrap_or_else(|e| e.into_inner());

        // Forget idle keys so the map stays bounded by recent traffic
        limiters.retain(|_, limiter| {
            limiter.evict(now);
            !limiter.timestamps.is_empty()
        });

        limiters
            .entry(key.to_string())
            .or_insert_with(|| RateLimiter::new(self.max_requests, self.window))
            .check_at(now)
    }

    /// Seconds until `key` may try again
    pub fn retry_after(&self, key: &str) -> Option<Duration> {
        let limiters = self.limiters.lock().unwrap_or_else(|e| e.into_inner());
        limiters.get(key).and_then(RateLimiter::reset_in)
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.limiters.lock().map(|l| l.len()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_rate_limiter_blocks_over_limit() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(1));

        for _ in 0..3 {
            assert!(limiter.check());
        }

        assert!(!limiter.check(), "Should block request over limit");
        assert_eq!(limiter.remaining(), 0);
    }

    #[test]
    fn test_rate_limiter_window_expiry() {
        let mut limiter = RateLimiter::new(2, Duration::from_millis(100));

        assert!(limiter.check());
        assert!(limiter.check());
        assert!(!limiter.check());

        thread::sleep(Duration::from_millis(150));

        assert!(limiter.check(), "Should allow after window expires");
    }

    #[test]
    fn test_reset_in() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(1));
        assert!(limiter.reset_in().is_none(), "Should be None with no requests");

        limiter.check();
        let reset = limiter.reset_in().unwrap();
        assert!(reset <= Duration::from_secs(1));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = KeyedRateLimiter::new(2, Duration::from_secs(60));

        assert!(limiter.check("ana"));
        assert!(limiter.check("ana"));
        assert!(!limiter.check("ana"), "Third attempt for ana is blocked");
        assert!(limiter.check("bo"), "bo has their own window");
        assert!(limiter.retry_after("ana").is_some());
        assert!(limiter.retry_after("cy").is_none());
    }

    #[test]
    fn test_idle_keys_are_forgotten() {
        let limiter = KeyedRateLimiter::new(1, Duration::from_millis(50));
        limiter.check("ana");
        limiter.check("bo");
        assert_eq!(limiter.tracked_keys(), 2);

        thread::sleep(Duration::from_millis(80));
        assert!(limiter.check("cy"));
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_login_limit() {
        let limiter = KeyedRateLimiter::login();
        for _ in 0..5 {
            assert!(limiter.check("ana"));
        }
        assert!(!limiter.check("ana"), "Login limiter should block 6th attempt");
    }
}

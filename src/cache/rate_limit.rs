//! Rate Limiter
//!
//! Fixed-window request counter per key (user id), used to keep the chat
//! endpoint from being spammed into the LLM.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Configuration for the rate limiter
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
    /// Stale windows are swept once this many keys are tracked
    pub sweep_threshold: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
            sweep_threshold: 1024,
        }
    }
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

struct Window {
    started_at: Instant,
    count: u32,
}

/// Per-key fixed-window limiter
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Count one request for `key`
    pub async fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock().await;
        let period = self.config.window;

        if windows.len() >= self.config.sweep_threshold {
            windows.retain(|_, w| now.duration_since(w.started_at) < period);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now.duration_since(window.started_at) >= period {
            window.started_at = now;
            window.count = 0;
        }

        if window.count >= self.config.max_requests {
            let retry_after = period.saturating_sub(now.duration_since(window.started_at));
            tracing::debug!(
                key = %key,
                retry_after_ms = retry_after.as_millis() as u64,
                "Rate limited"
            );
            return RateDecision::Limited { retry_after };
        }

        window.count += 1;
        RateDecision::Allowed {
            remaining: self.config.max_requests - window.count,
        }
    }

    /// Number of keys with a live or stale window
    pub async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window: Duration::from_secs(60),
            sweep_threshold: 4,
        })
    }

    #[tokio::test]
    async fn test_allows_up_to_limit() {
        let limiter = limiter(3);
        let now = Instant::now();

        assert_eq!(limiter.check_at("u1", now).await, RateDecision::Allowed { remaining: 2 });
        assert_eq!(limiter.check_at("u1", now).await, RateDecision::Allowed { remaining: 1 });
        assert_eq!(limiter.check_at("u1", now).await, RateDecision::Allowed { remaining: 0 });

        let later = now + Duration::from_secs(20);
        assert_eq!(
            limiter.check_at("u1", later).await,
            RateDecision::Limited {
                retry_after: Duration::from_secs(40)
            }
        );

        // Other keys are independent
        assert!(limiter.check_at("u2", later).await.is_allowed());
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = limiter(1);
        let now = Instant::now();

        assert!(limiter.check_at("u1", now).await.is_allowed());
        assert!(!limiter.check_at("u1", now).await.is_allowed());
        assert!(limiter
            .check_at("u1", now + Duration::from_secs(60))
            .await
            .is_allowed());
    }

    #[tokio::test]
    async fn test_stale_windows_are_swept() {
        let limiter = limiter(5);
        let now = Instant::now();
        for key in ["a", "b", "c", "d"] {
            limiter.check_at(key, now).await;
        }
        assert_eq!(limiter.tracked_keys().await, 4);

        limiter.check_at("e", now + Duration::from_secs(120)).await;
        assert_eq!(limiter.tracked_keys().await, 1);
    }
}

//! Fixed-window call budget for the enrichment service.
//!
//! [`RateLimiter`] answers one question per cycle: may the summarizer be
//! called now? Each grant increments a counter; once the counter reaches the
//! threshold every further request is denied until the window that the first
//! grant opened has lasted `reset_delay`. The next request after that closes
//! the window, zeroes the counter, and is evaluated against a fresh budget.
//!
//! # Concurrency
//!
//! The counter and the window start live behind a single [`Mutex`], so a
//! reset and an increment can never interleave. The lock is never held
//! across an `.await`.
//!
//! # Clock
//!
//! Time comes from [`tokio::time::Instant`], which follows tokio's paused
//! test clock. [`RateLimiter::try_acquire_at`] takes the instant explicitly.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::EngineConfig;

/// Thread-safe fixed-window call budget. Share it via `Arc<RateLimiter>`.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum grants per window.
    threshold: u32,
    /// Window length, measured from the first grant of the window.
    reset_delay: Duration,
    /// Mutable window state protected by a mutex.
    inner: Mutex<WindowState>,
}

/// Mutable budget state held inside the mutex.
#[derive(Debug, Default)]
struct WindowState {
    /// Grants issued in the current window.
    count: u32,
    /// When the current window opened; `None` while no window is open.
    window_start: Option<Instant>,
}

impl WindowState {
    /// Close the window if it has run its full length.
    fn expire(&mut self, now: Instant, reset_delay: Duration) {
        if let Some(start) = self.window_start
            && now.saturating_duration_since(start) >= reset_delay
        {
            debug!(
                previous_count = self.count,
                window_ms = reset_delay.as_millis(),
                "call budget window elapsed, counter reset"
            );
            self.count = 0;
            self.window_start = None;
        }
    }
}

/// Read-only view of the budget returned by [`RateLimiter::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterStatus {
    /// Grants issued in the current window.
    pub count: u32,
    /// Maximum grants per window.
    pub threshold: u32,
    /// Time left before the open window closes, if one is open.
    pub window_remaining: Option<Duration>,
}

impl RateLimiter {
    /// Create a limiter allowing `threshold` grants per `reset_delay`.
    pub const fn new(threshold: u32, reset_delay: Duration) -> Self {
        Self {
            threshold,
            reset_delay,
            inner: Mutex::new(WindowState {
                count: 0,
                window_start: None,
            }),
        }
    }

    /// Create a limiter from the engine tunables.
    pub const fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.acquire_threshold, config.reset_delay())
    }

    /// Try to take one unit of budget now.
    ///
    /// Returns `true` and records the grant if the budget allows it,
    /// otherwise returns `false` without touching the counter.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Try to take one unit of budget at the given instant.
    ///
    /// If the mutex is poisoned the request is denied rather than
    /// panicking; a denied cycle simply shows the raw score.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let Ok(mut state) = self.inner.lock() else {
            warn!("call budget mutex poisoned, denying enrichment");
            return false;
        };

        state.expire(now, self.reset_delay);

        if state.count >= self.threshold {
            return false;
        }

        if state.window_start.is_none() {
            state.window_start = Some(now);
        }
        state.count = state.count.saturating_add(1);
        true
    }

    /// Snapshot of the current budget.
    ///
    /// Reports the stored counter; an elapsed window is only closed by the
    /// next [`try_acquire`](Self::try_acquire).
    pub fn status(&self) -> LimiterStatus {
        self.status_at(Instant::now())
    }

    /// Snapshot of the budget as seen at the given instant.
    pub fn status_at(&self, now: Instant) -> LimiterStatus {
        let Ok(state) = self.inner.lock() else {
            return LimiterStatus {
                count: 0,
                threshold: self.threshold,
                window_remaining: None,
            };
        };

        LimiterStatus {
            count: state.count,
            threshold: self.threshold,
            window_remaining: state.window_start.map(|start| {
                self.reset_delay
                    .saturating_sub(now.saturating_duration_since(start))
            }),
        }
    }

    /// Maximum grants per window.
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Window length.
    pub const fn reset_delay(&self) -> Duration {
        self.reset_delay
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn grants_up_to_threshold_then_denies() {
        let limiter = RateLimiter::new(2, secs(60));
        let t0 = Instant::now();

        assert!(limiter.try_acquire_at(t0));
        assert!(limiter.try_acquire_at(t0 + secs(1)));
        assert!(!limiter.try_acquire_at(t0 + secs(2)));
        assert!(!limiter.try_acquire_at(t0 + secs(59)));
        assert_eq!(limiter.status_at(t0 + secs(59)).count, 2);
    }

    #[test]
    fn denial_does_not_increment() {
        let limiter = RateLimiter::new(1, secs(60));
        let t0 = Instant::now();

        assert!(limiter.try_acquire_at(t0));
        for offset in 1..10 {
            assert!(!limiter.try_acquire_at(t0 + secs(offset)));
        }
        assert_eq!(limiter.status_at(t0 + secs(10)).count, 1);
    }

    #[test]
    fn single_grant_is_replenished_after_window() {
        let limiter = RateLimiter::new(1, secs(60));
        let t0 = Instant::now();

        assert!(limiter.try_acquire_at(t0));
        assert!(!limiter.try_acquire_at(t0 + secs(30)));
        assert!(limiter.try_acquire_at(t0 + secs(60)));
    }

    #[test]
    fn zero_threshold_never_grants() {
        let limiter = RateLimiter::new(0, secs(60));
        let t0 = Instant::now();

        for offset in 0..5 {
            assert!(!limiter.try_acquire_at(t0 + secs(offset * 100)));
        }
        assert_eq!(limiter.status_at(t0).count, 0);
        assert_eq!(limiter.status_at(t0).window_remaining, None);
    }

    #[test]
    fn zero_reset_delay_never_limits() {
        let limiter = RateLimiter::new(2, Duration::ZERO);
        let t0 = Instant::now();

        for _ in 0..10 {
            assert!(limiter.try_acquire_at(t0));
        }
        assert!(limiter.status_at(t0).count <= 2);
    }

    #[test]
    fn window_is_measured_from_first_grant() {
        // threshold=2, window=60s, requests at 0, 10, 20, 70, 80.
        // The window opened at 0 closes at 60; the request at 70 opens a
        // new window [70, 130) that still has room at 80.
        let limiter = RateLimiter::new(2, secs(60));
        let t0 = Instant::now();

        let grants: Vec<bool> = [0, 10, 20, 70, 80]
            .iter()
            .map(|&offset| limiter.try_acquire_at(t0 + secs(offset)))
            .collect();

        assert_eq!(grants, vec![true, true, false, true, true]);
        assert!(!limiter.try_acquire_at(t0 + secs(90)));
        assert!(limiter.try_acquire_at(t0 + secs(130)));
    }

    #[test]
    fn count_never_exceeds_threshold_over_long_sequence() {
        let limiter = RateLimiter::new(3, secs(45));
        let t0 = Instant::now();

        for step in 0..500 {
            let now = t0 + Duration::from_millis(step * 700);
            let granted = limiter.try_acquire_at(now);
            let status = limiter.status_at(now);
            assert!(status.count <= 3);
            if granted {
                assert!(status.count >= 1);
            }
        }
    }

    #[test]
    fn status_reports_remaining_window() {
        let limiter = RateLimiter::new(2, secs(60));
        let t0 = Instant::now();

        assert!(limiter.try_acquire_at(t0));
        let status = limiter.status_at(t0 + secs(15));
        assert_eq!(status.count, 1);
        assert_eq!(status.threshold, 2);
        assert_eq!(status.window_remaining, Some(secs(45)));
    }

    #[test]
    fn from_config_uses_tunables() {
        let config = EngineConfig {
            acquire_threshold: 7,
            reset_delay_ms: 1500,
            ..EngineConfig::default()
        };
        let limiter = RateLimiter::from_config(&config);
        assert_eq!(limiter.threshold(), 7);
        assert_eq!(limiter.reset_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn thread_safety_concurrent_acquisition() {
        use std::thread;

        let limiter = Arc::new(RateLimiter::new(25, secs(3600)));
        let t0 = Instant::now();
        let mut handles = Vec::new();

        for _ in 0..10 {
            let l = Arc::clone(&limiter);
            handles.push(thread::spawn(move || {
                (0..100).filter(|_| l.try_acquire_at(t0)).count()
            }));
        }

        let granted: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap_or(0))
            .sum();

        assert_eq!(granted, 25);
        assert_eq!(limiter.status_at(t0).count, 25);
    }

    #[tokio::test(start_paused = true)]
    async fn follows_paused_tokio_clock() {
        let limiter = RateLimiter::new(1, secs(60));

        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        tokio::time::advance(secs(59)).await;
        assert!(!limiter.try_acquire());

        tokio::time::advance(secs(1)).await;
        assert!(limiter.try_acquire());
    }
}

//! Sliding-window rate limiter for upstream requests.
//!
//! Keeps the timestamps of the requests issued during the last window and
//! suspends callers once the window's budget is spent. Every request to the
//! upstream source goes through [`RateLimiter::wait`].

use std::collections::VecDeque;
use std::time::Duration;

use log::debug;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default budget: 30 requests per window.
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 30;

/// Default window length: one minute.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);

/// Rate limiter configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests admitted inside one window.
    pub requests_per_window: u32,
    /// Length of the sliding window.
    pub window: Duration,
}

impl RateLimitConfig {
    /// A budget of `requests` per one-minute window.
    pub fn per_minute(requests: u32) -> Self {
        Self {
            requests_per_window: requests,
            window: DEFAULT_WINDOW,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::per_minute(DEFAULT_REQUESTS_PER_MINUTE)
    }
}

/// Request timestamps (milliseconds since the limiter's epoch), oldest first.
#[derive(Debug)]
struct Window {
    stamps: VecDeque<u64>,
    budget: usize,
    length_ms: u64,
}

impl Window {
    fn new(budget: usize, length_ms: u64) -> Self {
        Self {
            stamps: VecDeque::with_capacity(budget),
            budget: budget.max(1),
            length_ms,
        }
    }

    /// Drop timestamps that fell out of the window ending at `now_ms`.
    fn prune(&mut self, now_ms: u64) {
        while let Some(&oldest) = self.stamps.front() {
            if now_ms.saturating_sub(oldest) >= self.length_ms {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Milliseconds to wait before one more request fits; zero when it fits now.
    fn wait_time(&mut self, now_ms: u64) -> u64 {
        self.prune(now_ms);
        if self.stamps.len() < self.budget {
            return 0;
        }
        match self.stamps.front() {
            Some(&oldest) => self.length_ms.saturating_sub(now_ms.saturating_sub(oldest)),
            None => 0,
        }
    }

    fn record(&mut self, now_ms: u64) {
        self.stamps.push_back(now_ms);
    }
}

/// Sliding-window rate limiter shared by all concurrent upstream calls.
///
/// Admission and recording happen under one lock, so concurrent callers can
/// never oversubscribe the budget. The lock is a FIFO-fair async mutex: a
/// caller that has to wait holds its place in line while it sleeps, and every
/// caller eventually proceeds.
pub struct RateLimiter {
    config: RateLimitConfig,
    epoch: Instant,
    window: Mutex<Window>,
}

impl RateLimiter {
    /// Create a limiter with the given budget and window.
    pub fn new(config: RateLimitConfig) -> Self {
        let window = Window::new(
            config.requests_per_window as usize,
            config.window.as_millis() as u64,
        );
        Self {
            config,
            epoch: Instant::now(),
            window: Mutex::new(window),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Wait until one more request fits in the window, then record it.
    pub async fn wait(&self) {
        let mut window = self.window.lock().await;
        loop {
            let now = self.now_ms();
            let wait_ms = window.wait_time(now);
            if wait_ms == 0 {
                window.record(now);
                return;
            }

            debug!(
                "Rate limiter: budget of {} spent, waiting {}ms",
                self.config.requests_per_window, wait_ms
            );
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

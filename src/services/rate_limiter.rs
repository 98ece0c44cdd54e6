//! Sliding-window limiter for outbound grammar requests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Grants at most `limit` requests within any `window`-long interval
///
/// Denied requests are not queued; the caller decides what to do.
pub struct RateLimiter {
    inner: Mutex<Window>,
}

struct Window {
    limit: u32,
    duration: Duration,
    /// Timestamps of granted requests, oldest first
    granted: VecDeque<Instant>,
}

impl Window {
    fn evict(&mut self, now: Instant) {
        while self
            .granted
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= self.duration)
        {
            self.granted.pop_front();
        }
    }
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            inner: Mutex::new(Window {
                limit,
                duration: window,
                granted: VecDeque::new(),
            }),
        }
    }

    /// Grant a request now if the window has room
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Grant a request at `now` if the window has room
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut window = self.lock();
        window.evict(now);

        if (window.granted.len() as u32) < window.limit {
            window.granted.push_back(now);
            true
        } else {
            false
        }
    }

    /// Time until the next request would be granted (zero if one would be now)
    pub fn wait_duration(&self) -> Duration {
        let now = Instant::now();
        let mut window = self.lock();
        window.evict(now);

        if (window.granted.len() as u32) < window.limit {
            return Duration::ZERO;
        }

        // Oldest grant leaves the window first
        window
            .granted
            .front()
            .map(|oldest| window.duration.saturating_sub(now.saturating_duration_since(*oldest)))
            .unwrap_or(Duration::ZERO)
    }

    /// Requests granted within the current window
    pub fn requests_in_window(&self) -> u32 {
        let mut window = self.lock();
        window.evict(Instant::now());
        window.granted.len() as u32
    }

    pub fn limit(&self) -> u32 {
        self.lock().limit
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Window> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

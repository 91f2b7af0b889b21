//! Request pacing: the static delay policy between requests and retries.
//!
//! Components never call `thread::sleep` themselves; they ask a [`Pacer`].
//! Production uses [`FixedPacer`], tests inject [`NoDelay`].

use std::time::Duration;

pub trait Pacer: Send + Sync {
    /// Called after every request, whatever its outcome.
    fn between_requests(&self);

    /// Called before retry number `attempt` (1 = first retry).
    fn before_retry(&self, attempt: u32);
}

/// Sleeps a fixed amount; no growth, no jitter.
#[derive(Debug, Clone, Copy)]
pub struct FixedPacer {
    pub request_delay: Duration,
    pub retry_delay: Duration,
}

impl FixedPacer {
    pub fn new(request_delay: Duration, retry_delay: Duration) -> Self {
        Self {
            request_delay,
            retry_delay,
        }
    }
}

impl Pacer for FixedPacer {
    fn between_requests(&self) {
        if !self.request_delay.is_zero() {
            std::thread::sleep(self.request_delay);
        }
    }

    fn before_retry(&self, _attempt: u32) {
        if !self.retry_delay.is_zero() {
            std::thread::sleep(self.retry_delay);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacer for NoDelay {
    fn between_requests(&self) {}

    fn before_retry(&self, _attempt: u32) {}
}

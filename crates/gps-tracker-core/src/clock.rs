//! Monotonic time source.

use std::time::{Duration, Instant};

/// Millisecond clock with a blocking sleep.
pub trait Clock {
    /// Milliseconds elapsed since the clock started. Never goes backwards.
    fn now_ms(&self) -> u64;

    /// Block the calling thread.
    fn sleep(&self, duration: Duration);
}

/// Clock backed by `std::time::Instant`, starting at zero on creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

//! Report timer.
//!
//! The scheduler is a two-phase state machine polled from the main loop:
//! it stays [`Phase::Idle`] until more than one interval has passed since
//! the last report, then yields [`Phase::Due`] once and re-arms.

use std::time::Duration;

/// Time between two timer-driven reports.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Scheduling decision for one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the interval to elapse.
    Idle,
    /// A report is due now. The timer has already been re-armed.
    Due,
}

/// Timestamps driving the report timer, in clock milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    /// Clock reading at the last poll.
    pub current_ms: u64,
    /// Clock reading when the last report was sent.
    pub updated_ms: u64,
    /// Interval between reports.
    pub interval_ms: u64,
}

impl TimerState {
    /// Timer armed at clock zero.
    pub fn new(interval: Duration) -> Self {
        Self {
            current_ms: 0,
            updated_ms: 0,
            interval_ms: interval.as_millis() as u64,
        }
    }

    /// Advance the timer to `now_ms`.
    ///
    /// Returns [`Phase::Due`] when strictly more than one interval has
    /// elapsed since the last report, and records `now_ms` as the new
    /// reference point.
    pub fn poll(&mut self, now_ms: u64) -> Phase {
        self.current_ms = now_ms;
        if self.current_ms.saturating_sub(self.updated_ms) > self.interval_ms {
            self.updated_ms = self.current_ms;
            Phase::Due
        } else {
            Phase::Idle
        }
    }

    /// Restart the interval at `now_ms`, after a report sent outside the
    /// timer.
    pub fn rearm(&mut self, now_ms: u64) {
        self.current_ms = now_ms;
        self.updated_ms = now_ms;
    }

    /// Milliseconds until the next report becomes due, as of the last poll.
    pub fn remaining_ms(&self) -> u64 {
        (self.updated_ms + self.interval_ms + 1).saturating_sub(self.current_ms)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(REPORT_INTERVAL)
    }
}

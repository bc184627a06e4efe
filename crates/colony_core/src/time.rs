//! In-game clock and periodic timers.
//!
//! Nothing here reads the wall clock. Callers pass elapsed time in
//! explicitly, so schedules are reproducible in tests.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Minutes in an in-game day.
pub const MINUTES_PER_DAY: u64 = 24 * 60;

/// In-game time, counted in minutes from the start of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GameTime {
    minutes: u64,
}

impl GameTime {
    /// Create a time from minutes since the start.
    #[must_use]
    pub const fn from_minutes(minutes: u64) -> Self {
        Self { minutes }
    }

    /// Minutes since the start.
    #[must_use]
    pub const fn minutes(self) -> u64 {
        self.minutes
    }

    /// Day component.
    #[must_use]
    pub const fn day(self) -> u64 {
        self.minutes / MINUTES_PER_DAY
    }

    /// Advance by `minutes`.
    ///
    /// Returns `true` if the day component changed.
    pub fn advance(&mut self, minutes: u64) -> bool {
        let before = self.day();
        self.minutes += minutes;
        self.day() != before
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_day = self.minutes % MINUTES_PER_DAY;
        write!(f, "day {} {:02}:{:02}", self.day(), in_day / 60, in_day % 60)
    }
}

/// A fixed-period timer driven by explicit elapsed time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicTimer {
    period: Duration,
    accumulated: Duration,
    running: bool,
}

impl PeriodicTimer {
    /// Create a stopped timer.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            accumulated: Duration::ZERO,
            running: false,
        }
    }

    /// Start firing.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Stop firing. Time accumulated so far is discarded.
    pub fn stop(&mut self) {
        self.running = false;
        self.accumulated = Duration::ZERO;
    }

    /// Whether the timer is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Timer period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Let `elapsed` pass and return how many firings fell due.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if !self.running || self.period.is_zero() {
            return 0;
        }
        self.accumulated += elapsed;
        let mut due = 0;
        while self.accumulated >= self.period {
            self.accumulated -= self.period;
            due += 1;
        }
        due
    }
}

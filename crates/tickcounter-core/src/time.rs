//! Wall-clock sources.

use std::cell::Cell;

use chrono::{DateTime, Local, TimeDelta};

/// Supplies the current local instant on demand.
pub trait TimeSource {
    fn now(&self) -> DateTime<Local>;
}

/// The real local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to. Used by tests and replays.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Local>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Move the clock forward (or backward, for negative deltas).
    pub fn advance(&self, delta: TimeDelta) {
        self.now.set(self.now.get() + delta);
    }

    /// Jump to an absolute instant.
    pub fn set(&self, instant: DateTime<Local>) {
        self.now.set(instant);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let start = Local::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(TimeDelta::seconds(5));
        assert_eq!(clock.now() - start, TimeDelta::seconds(5));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_borrowed_source_delegates() {
        let start = Local::now();
        let clock = ManualClock::new(start);
        let borrowed: &ManualClock = &clock;
        assert_eq!(TimeSource::now(&borrowed), start);
    }
}

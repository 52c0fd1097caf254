//! Decomposition of a millisecond duration into display fields.

use chrono::{DateTime, Local, Timelike};

pub const MS_PER_SECOND: u64 = 1_000;
pub const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
pub const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
pub const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Length of an average Julian year (365.25 days).
///
/// This is a calendar approximation, not a calendar-exact year: a countdown
/// spanning a leap day does not gain or lose a day at a year boundary. The
/// value happens to be a whole number of milliseconds, so integer division
/// stays exact.
pub const MS_PER_YEAR: u64 = 365 * MS_PER_DAY + MS_PER_DAY / 4;

/// Remaining time split into years, days, hours, minutes and seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeBreakdown {
    pub years: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeBreakdown {
    /// Break a positive millisecond duration down by successive division.
    ///
    /// Each step consumes the remainder of the previous one; sub-second
    /// milliseconds are dropped.
    pub fn from_millis(ms: u64) -> Self {
        let years = ms / MS_PER_YEAR;
        let rem = ms % MS_PER_YEAR;
        let days = rem / MS_PER_DAY;
        let rem = rem % MS_PER_DAY;
        let hours = rem / MS_PER_HOUR;
        let rem = rem % MS_PER_HOUR;
        let minutes = rem / MS_PER_MINUTE;
        let rem = rem % MS_PER_MINUTE;
        let seconds = rem / MS_PER_SECOND;

        Self {
            years,
            days,
            hours,
            minutes,
            seconds,
        }
    }

    /// Recombine the fields into milliseconds.
    pub fn total_millis(&self) -> u64 {
        self.years * MS_PER_YEAR
            + self.days * MS_PER_DAY
            + self.hours * MS_PER_HOUR
            + self.minutes * MS_PER_MINUTE
            + self.seconds * MS_PER_SECOND
    }

    /// The years field is only displayed when non-zero.
    pub fn show_years(&self) -> bool {
        self.years > 0
    }

    /// Years, unpadded.
    pub fn years_text(&self) -> String {
        self.years.to_string()
    }

    /// Days, unpadded.
    pub fn days_text(&self) -> String {
        self.days.to_string()
    }

    /// Hours, minutes and seconds, each padded to two digits.
    pub fn hms_text(&self) -> [String; 3] {
        [
            format!("{:02}", self.hours),
            format!("{:02}", self.minutes),
            format!("{:02}", self.seconds),
        ]
    }
}

/// Wall-clock hour/minute/second shown in clock mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockFields {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl ClockFields {
    pub fn from_instant(now: DateTime<Local>) -> Self {
        Self {
            hours: now.hour(),
            minutes: now.minute(),
            seconds: now.second(),
        }
    }

    /// Hours, minutes and seconds, each padded to two digits.
    pub fn hms_text(&self) -> [String; 3] {
        [
            format!("{:02}", self.hours),
            format!("{:02}", self.minutes),
            format!("{:02}", self.seconds),
        ]
    }
}

//! Core timing types for the tickcounter countdown.
//!
//! This crate holds everything that does not touch a drawing surface:
//! the wall-clock abstraction, the millisecond breakdown used for display,
//! the Clock/Countdown/Expired state machine and the cooperative task
//! scheduler that drives both the 1 Hz tick and the per-frame animation.

mod breakdown;
mod countdown;
mod scheduler;
mod time;

pub use breakdown::{
    ClockFields, MS_PER_DAY, MS_PER_HOUR, MS_PER_MINUTE, MS_PER_SECOND, MS_PER_YEAR,
    TimeBreakdown,
};
pub use countdown::{CountdownState, CountdownStateMachine, Display, Mode, TickOutcome};
pub use scheduler::{Scheduler, TaskHandle};
pub use time::{ManualClock, SystemClock, TimeSource};

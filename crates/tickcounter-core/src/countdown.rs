//! Clock / Countdown / Expired state machine.

use std::fmt;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::breakdown::{ClockFields, TimeBreakdown};
use crate::time::TimeSource;

/// Active display mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// No target: show the wall clock.
    #[default]
    Clock,
    /// Counting down to a target in the future.
    Countdown,
    /// The target was reached. Only a new target leaves this mode.
    Expired,
}

/// What the display should show after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Clock(ClockFields),
    Countdown(TimeBreakdown),
    Expired,
}

/// Result of a single 1 Hz tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Display updated; keep ticking.
    Updated(Display),
    /// The countdown just reached zero. Emitted once per countdown run;
    /// the caller must stop the tick and start the explosion.
    Expired,
    /// Nothing to do (already expired).
    Idle,
}

/// Snapshot of the live state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountdownState {
    pub mode: Mode,
    pub target: Option<DateTime<Local>>,
    pub last_breakdown: Option<TimeBreakdown>,
}

/// The countdown state machine.
///
/// Mode transitions are the only writers of [`CountdownState`]. The expired
/// event fires once per run: the tick that sees the target pass moves to
/// Expired, and Expired only ever ticks `Idle`.
#[derive(Debug, Default)]
pub struct CountdownStateMachine {
    state: CountdownState,
}

impl CountdownStateMachine {
    /// Start in clock mode.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn target(&self) -> Option<DateTime<Local>> {
        self.state.target
    }

    pub fn state(&self) -> &CountdownState {
        &self.state
    }

    /// Supply or clear the target.
    ///
    /// `Some` enters Countdown from any mode, even if the target is already in
    /// the past; the next tick then expires immediately. `None` returns to
    /// Clock.
    pub fn set_target(&mut self, target: Option<DateTime<Local>>) -> Mode {
        self.state.last_breakdown = None;
        match target {
            Some(t) => {
                info!(deadline = %t, "countdown started");
                self.state.target = Some(t);
                self.state.mode = Mode::Countdown;
            }
            None => {
                debug!("target cleared, clock mode");
                self.state.target = None;
                self.state.mode = Mode::Clock;
            }
        }
        self.state.mode
    }

    /// Apply the result of parsing a caller-supplied target.
    ///
    /// A parse failure never reaches Countdown: the machine reverts to Clock.
    pub fn try_set_target<E: fmt::Display>(
        &mut self,
        parsed: Result<DateTime<Local>, E>,
    ) -> Mode {
        match parsed {
            Ok(t) => self.set_target(Some(t)),
            Err(e) => {
                warn!(error = %e, "invalid countdown target, falling back to clock");
                self.set_target(None)
            }
        }
    }

    /// Advance by one tick using `clock` as the current instant.
    pub fn tick(&mut self, clock: &impl TimeSource) -> TickOutcome {
        let now = clock.now();
        match (self.state.mode, self.state.target) {
            (Mode::Clock, _) | (Mode::Countdown, None) => {
                self.state.mode = Mode::Clock;
                TickOutcome::Updated(Display::Clock(ClockFields::from_instant(now)))
            }
            (Mode::Countdown, Some(target)) => {
                let diff = (target - now).num_milliseconds();
                if diff <= 0 {
                    self.state.mode = Mode::Expired;
                    self.state.last_breakdown = None;
                    info!(deadline = %target, "countdown expired");
                    return TickOutcome::Expired;
                }
                let breakdown = TimeBreakdown::from_millis(diff as u64);
                self.state.last_breakdown = Some(breakdown);
                TickOutcome::Updated(Display::Countdown(breakdown))
            }
            (Mode::Expired, _) => TickOutcome::Idle,
        }
    }

    /// Current display without advancing time.
    pub fn display(&self, clock: &impl TimeSource) -> Display {
        match self.state.mode {
            Mode::Clock => Display::Clock(ClockFields::from_instant(clock.now())),
            Mode::Countdown => Display::Countdown(self.state.last_breakdown.unwrap_or_default()),
            Mode::Expired => Display::Expired,
        }
    }
}

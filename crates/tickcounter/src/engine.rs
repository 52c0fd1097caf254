//! Wires the countdown to the animations.
//!
//! [`Engine`] owns one [`Scheduler`] with two independent tasks: the frame
//! task (starfield plus any explosion run) and the 1 Hz countdown tick. The
//! tick hands off to the explosion synchronously when it sees the target
//! pass; from then on only the frame task advances the run.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tickcounter_config::{Config, parse_target};
use tickcounter_core::{
    CountdownStateMachine, Display, Mode, Scheduler, TaskHandle, TickOutcome, TimeSource,
};
use tickcounter_effects::{
    ExplosionSequencer, ExplosionSettings, Layers, PointCloudBackend, Raster, RenderError,
    Renderer, SoftwarePointRenderer, StarfieldAnimator, StarfieldSettings, StepOutcome,
};
use tracing::{debug, info};

const TICK_PERIOD: Duration = Duration::from_millis(1000);

/// Something the UI may want to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The countdown reached its target.
    Expired,
    /// An explosion run played to the end.
    ExplosionFinished,
}

/// Startup tuning, usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub fps: u32,
    pub starfield: StarfieldSettings,
    pub explosion: ExplosionSettings,
    pub explosion_enabled: bool,
    pub seed: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fps: 60,
            starfield: StarfieldSettings::default(),
            explosion: ExplosionSettings::default(),
            explosion_enabled: true,
            seed: 0,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config, seed: u64) -> Self {
        let e = &config.explosion;
        Self {
            fps: config.fps,
            starfield: StarfieldSettings {
                count: config.starfield.count,
                speed: config.starfield.speed,
            },
            explosion: ExplosionSettings {
                particle_count: e.particle_count,
                converge_ratio: e.converge_ratio,
                converge_epsilon: e.converge_epsilon,
                implode_timeout_secs: e.implode_timeout_secs,
                flash_secs: e.flash_secs,
                explode_secs: e.explode_secs,
                drag: e.drag,
                max_frame_dt: e.max_frame_dt,
                ..ExplosionSettings::default()
            },
            explosion_enabled: e.enabled,
            seed,
        }
    }
}

/// The running countdown display and its animations.
#[derive(Debug)]
pub struct Engine<C> {
    clock: C,
    scheduler: Scheduler,
    frame_task: TaskHandle,
    tick_task: Option<TaskHandle>,
    countdown: CountdownStateMachine,
    display: Display,
    starfield: StarfieldAnimator,
    renderer: Renderer<Raster, SoftwarePointRenderer>,
    explosion: Option<ExplosionSequencer>,
    /// Expired before the surfaces had a size; start on the first sized frame.
    pending_explosion: bool,
    explosion_settings: ExplosionSettings,
    last_frame: Option<Instant>,
    runs: u64,
    seed: u64,
}

impl<C: TimeSource> Engine<C> {
    /// Start in clock mode with both tasks due immediately.
    pub fn new(clock: C, settings: EngineSettings, now: Instant) -> Self {
        let mut scheduler = Scheduler::new();
        let frame_period = Duration::from_secs(1) / settings.fps.max(1);
        let frame_task = scheduler.schedule_repeating(frame_period, now);
        let tick_task = Some(scheduler.schedule_repeating(TICK_PERIOD, now));
        let countdown = CountdownStateMachine::new();
        let display = countdown.display(&clock);

        Self {
            clock,
            scheduler,
            frame_task,
            tick_task,
            countdown,
            display,
            starfield: StarfieldAnimator::new(settings.starfield, settings.seed),
            renderer: Renderer::new(
                Raster::default(),
                SoftwarePointRenderer::new(settings.explosion_enabled),
            ),
            explosion: None,
            pending_explosion: false,
            explosion_settings: settings.explosion,
            last_frame: None,
            runs: 0,
            seed: settings.seed,
        }
    }

    pub fn mode(&self) -> Mode {
        self.countdown.mode()
    }

    pub fn display(&self) -> Display {
        self.display
    }

    pub fn target(&self) -> Option<DateTime<Local>> {
        self.countdown.target()
    }

    pub fn explosion(&self) -> Option<&ExplosionSequencer> {
        self.explosion.as_ref()
    }

    pub fn starfield(&self) -> &StarfieldAnimator {
        &self.starfield
    }

    pub fn is_ticking(&self) -> bool {
        self.tick_task
            .is_some_and(|handle| self.scheduler.is_active(handle))
    }

    /// Count down to `target`. Leaves Expired; restarts the 1 Hz tick.
    pub fn start_countdown(&mut self, target: DateTime<Local>, now: Instant) -> Mode {
        self.reset_explosion();
        self.countdown.set_target(Some(target));
        self.restart_tick(now)
    }

    /// Back to the wall clock.
    pub fn clear_target(&mut self, now: Instant) -> Mode {
        self.reset_explosion();
        self.countdown.set_target(None);
        self.restart_tick(now)
    }

    /// Parse and apply user input. Blank input clears the target; anything
    /// unparseable falls back to the clock.
    pub fn apply_target_str(&mut self, input: &str, now: Instant) -> Mode {
        if input.trim().is_empty() {
            return self.clear_target(now);
        }
        self.reset_explosion();
        self.countdown.try_set_target(parse_target(input));
        self.restart_tick(now)
    }

    /// Drop any explosion run, finished or not, and blank its surface.
    fn reset_explosion(&mut self) {
        self.explosion = None;
        self.pending_explosion = false;
        self.renderer.points_mut().clear();
    }

    fn restart_tick(&mut self, now: Instant) -> Mode {
        if let Some(old) = self.tick_task.take() {
            self.scheduler.cancel(old);
        }
        self.tick_task = Some(self.scheduler.schedule_repeating(TICK_PERIOD, now));
        // A countdown display only ever comes from a tick, so a target that
        // is already past goes straight to Expired.
        if self.countdown.mode() != Mode::Countdown {
            self.display = self.countdown.display(&self.clock);
        }
        self.countdown.mode()
    }

    /// Fit every surface to a terminal area of `cols` x `rows` cells.
    pub fn resize(&mut self, cols: u16, rows: u16) -> bool {
        let (width, height) = Raster::size_for_cells(cols, rows);
        self.renderer.resize(width, height, &mut self.starfield)
    }

    /// How long the host may wait before calling [`Self::run_due`].
    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.scheduler
            .time_until_next(now)
            .unwrap_or(TICK_PERIOD)
    }

    /// Run every task whose deadline has passed.
    pub fn run_due(&mut self, now: Instant) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        for handle in self.scheduler.due(now) {
            if handle == self.frame_task {
                self.frame(now, &mut events);
            } else if Some(handle) == self.tick_task {
                self.tick(now, &mut events);
            }
        }
        events
    }

    fn frame(&mut self, now: Instant, events: &mut Vec<EngineEvent>) {
        if self.pending_explosion {
            self.start_explosion(now);
        }
        let dt = self
            .last_frame
            .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f32());
        self.last_frame = Some(now);

        self.renderer.draw_starfield(&mut self.starfield);
        if let Some(run) = self.explosion.as_mut() {
            if run.is_finished() {
                return;
            }
            if self.renderer.draw_explosion(run, dt) == StepOutcome::Finished {
                events.push(EngineEvent::ExplosionFinished);
            }
        }
    }

    fn tick(&mut self, now: Instant, events: &mut Vec<EngineEvent>) {
        match self.countdown.tick(&self.clock) {
            TickOutcome::Updated(display) => self.display = display,
            TickOutcome::Expired => {
                if let Some(handle) = self.tick_task.take() {
                    self.scheduler.cancel(handle);
                }
                self.display = Display::Expired;
                self.start_explosion(now);
                events.push(EngineEvent::Expired);
            }
            TickOutcome::Idle => {}
        }
    }

    fn start_explosion(&mut self, now: Instant) {
        self.pending_explosion =
            self.renderer.points().check_available() == Err(RenderError::EmptySurface);
        if self.pending_explosion {
            debug!("explosion waits for a sized surface");
            return;
        }
        let seed = self.seed.wrapping_add(self.runs);
        self.runs += 1;
        self.explosion = ExplosionSequencer::start(
            self.explosion_settings.clone(),
            self.renderer.points_mut(),
            seed,
        );
        // Start the run's clock now so the first dt is not the idle gap.
        self.last_frame = Some(now);
        match &self.explosion {
            Some(_) => info!(run = self.runs, "explosion armed"),
            None => debug!("no explosion this time"),
        }
    }

    /// The composed background: starfield with the explosion on top.
    pub fn layers(&self) -> Layers<'_> {
        let overlay = self
            .explosion
            .as_ref()
            .map(|_| self.renderer.points().raster());
        self.renderer.stars().with_overlay(overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use tickcounter_core::{ManualClock, TimeBreakdown};
    use tickcounter_effects::{Phase, Rgb};

    const FRAME: Duration = Duration::from_micros(16_667);

    fn settings() -> EngineSettings {
        EngineSettings {
            explosion: ExplosionSettings {
                particle_count: 500,
                ..ExplosionSettings::default()
            },
            seed: 11,
            ..EngineSettings::default()
        }
    }

    fn engine(start: DateTime<Local>, now: Instant) -> Engine<ManualClock> {
        let mut engine = Engine::new(ManualClock::new(start), settings(), now);
        engine.resize(80, 24);
        engine
    }

    /// Advance both clocks by `step` and run whatever is due.
    fn advance(
        engine: &mut Engine<ManualClock>,
        now: &mut Instant,
        step: Duration,
    ) -> Vec<EngineEvent> {
        *now += step;
        engine.clock.advance(TimeDelta::from_std(step).unwrap());
        engine.run_due(*now)
    }

    #[test]
    fn test_clock_mode_ticks() {
        let start = Local::now();
        let now = Instant::now();
        let mut engine = engine(start, now);
        assert!(engine.run_due(now).is_empty());
        assert_eq!(engine.mode(), Mode::Clock);
        assert!(matches!(engine.display(), Display::Clock(_)));
        assert!(engine.is_ticking());
    }

    #[test]
    fn test_countdown_display() {
        let start = Local::now();
        let mut now = Instant::now();
        let mut engine = engine(start, now);
        engine.start_countdown(start + TimeDelta::minutes(90), now);
        engine.run_due(now);
        assert_eq!(
            engine.display(),
            Display::Countdown(TimeBreakdown {
                years: 0,
                days: 0,
                hours: 1,
                minutes: 30,
                seconds: 0,
            })
        );

        advance(&mut engine, &mut now, Duration::from_secs(1));
        let Display::Countdown(b) = engine.display() else {
            panic!("expected countdown");
        };
        assert_eq!((b.hours, b.minutes, b.seconds), (1, 29, 59));
    }

    #[test]
    fn test_expiry_hands_off_to_explosion() {
        let start = Local::now();
        let mut now = Instant::now();
        let mut engine = engine(start, now);
        engine.start_countdown(start + TimeDelta::seconds(2), now);
        engine.run_due(now);

        let mut expired = 0;
        for _ in 0..(3 * 60) {
            let events = advance(&mut engine, &mut now, FRAME);
            expired += events.iter().filter(|e| **e == EngineEvent::Expired).count();
        }
        assert_eq!(expired, 1);
        assert_eq!(engine.mode(), Mode::Expired);
        assert_eq!(engine.display(), Display::Expired);
        assert!(!engine.is_ticking());
        let run = engine.explosion().unwrap();
        assert_eq!(run.buffer().len(), 500);
    }

    #[test]
    fn test_explosion_runs_to_completion() {
        let start = Local::now();
        let mut now = Instant::now();
        let mut engine = engine(start, now);
        engine.start_countdown(start - TimeDelta::seconds(1), now);
        assert_eq!(engine.run_due(now), vec![EngineEvent::Expired]);
        assert_eq!(engine.explosion().unwrap().phase(), Phase::Implode);

        let mut finished = false;
        // Implode times out at 1.5 s, flash 0.1 s, explode 10 s.
        for _ in 0..(13 * 60) {
            if advance(&mut engine, &mut now, FRAME).contains(&EngineEvent::ExplosionFinished) {
                finished = true;
                break;
            }
        }
        assert!(finished);
        assert!(engine.explosion().unwrap().is_finished());
        assert_eq!(engine.mode(), Mode::Expired);
    }

    #[test]
    fn test_past_target_never_shows_countdown() {
        let start = Local::now();
        let now = Instant::now();
        let mut engine = engine(start, now);
        engine.run_due(now);
        engine.start_countdown(start - TimeDelta::hours(1), now);
        assert!(!matches!(engine.display(), Display::Countdown(_)));
        assert_eq!(engine.run_due(now), vec![EngineEvent::Expired]);
        assert_eq!(engine.display(), Display::Expired);
    }

    #[test]
    fn test_new_target_leaves_expired() {
        let start = Local::now();
        let now = Instant::now();
        let mut engine = engine(start, now);
        engine.start_countdown(start, now);
        engine.run_due(now);
        assert_eq!(engine.mode(), Mode::Expired);

        let mode = engine.start_countdown(start + TimeDelta::days(1), now);
        assert_eq!(mode, Mode::Countdown);
        assert!(engine.is_ticking());
        engine.run_due(now);
        assert!(matches!(engine.display(), Display::Countdown(_)));
    }

    #[test]
    fn test_expiry_before_first_resize_starts_later() {
        let start = Local::now();
        let mut now = Instant::now();
        let mut engine = Engine::new(ManualClock::new(start), settings(), now);
        engine.start_countdown(start - TimeDelta::seconds(1), now);
        assert_eq!(engine.run_due(now), vec![EngineEvent::Expired]);
        assert!(engine.explosion().is_none());

        engine.resize(80, 24);
        advance(&mut engine, &mut now, FRAME);
        let run = engine.explosion().unwrap();
        assert_eq!(run.phase(), Phase::Implode);
        assert_eq!(run.buffer().len(), 500);
    }

    #[test]
    fn test_new_countdown_clears_old_explosion() {
        let start = Local::now();
        let mut now = Instant::now();
        let mut engine = engine(start, now);
        engine.start_countdown(start - TimeDelta::seconds(1), now);
        engine.run_due(now);
        for _ in 0..30 {
            advance(&mut engine, &mut now, FRAME);
        }
        assert!(engine.explosion().is_some());

        engine.start_countdown(start + TimeDelta::hours(1), now);
        advance(&mut engine, &mut now, FRAME);
        assert!(engine.explosion().is_none());
        let points = engine.renderer.points();
        assert_eq!(points.particle_count(), 0);
        let raster = points.raster();
        for y in 0..raster.height() {
            for x in 0..raster.width() {
                assert_eq!(raster.get(x, y), Some(Rgb::BLACK));
            }
        }
    }

    #[test]
    fn test_clearing_target_clears_explosion() {
        let start = Local::now();
        let mut now = Instant::now();
        let mut engine = engine(start, now);
        engine.start_countdown(start, now);
        engine.run_due(now);
        advance(&mut engine, &mut now, FRAME);
        assert!(engine.explosion().is_some());

        assert_eq!(engine.apply_target_str("", now), Mode::Clock);
        assert!(engine.explosion().is_none());
        assert_eq!(engine.renderer.points().particle_count(), 0);
    }

    #[test]
    fn test_invalid_input_falls_back_to_clock() {
        let start = Local::now();
        let now = Instant::now();
        let mut engine = engine(start, now);
        engine.start_countdown(start + TimeDelta::hours(1), now);
        assert_eq!(engine.apply_target_str("not a date", now), Mode::Clock);
        assert_eq!(engine.target(), None);
        assert_eq!(engine.apply_target_str("   ", now), Mode::Clock);
    }

    #[test]
    fn test_disabled_explosion_is_skipped() {
        let start = Local::now();
        let now = Instant::now();
        let mut engine = Engine::new(
            ManualClock::new(start),
            EngineSettings {
                explosion_enabled: false,
                ..settings()
            },
            now,
        );
        engine.resize(40, 12);
        engine.start_countdown(start, now);
        assert_eq!(engine.run_due(now), vec![EngineEvent::Expired]);
        assert!(engine.explosion().is_none());
        assert_eq!(engine.mode(), Mode::Expired);
    }

    #[test]
    fn test_resize_regenerates_stars() {
        let now = Instant::now();
        let mut engine = engine(Local::now(), now);
        assert_eq!(engine.starfield().stars().len(), 300);
        assert!(engine.resize(100, 30));
        assert!(!engine.resize(100, 30));
        assert_eq!(engine.starfield().stars().len(), 300);
        assert!(engine.starfield().stars().iter().all(|s| s.z <= 100.0));
    }

    #[test]
    fn test_next_wakeup_tracks_frame_rate() {
        let now = Instant::now();
        let mut engine = engine(Local::now(), now);
        engine.run_due(now);
        let wait = engine.time_until_next(now);
        assert!(wait <= Duration::from_millis(17));
        assert!(wait > Duration::ZERO);
    }
}

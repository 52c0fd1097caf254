//! Expiry explosion: implode, flash, explode.
//!
//! One run is a single forward pass through [`Phase`]. All physics and phase
//! checks happen inside [`ExplosionSequencer::step`], which the host calls
//! once per rendered frame with the elapsed frame time.

use std::ops::RangeInclusive;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use tracing::{debug, info, warn};

use crate::color::hsl_to_rgb;
use crate::particles::{ParticleBuffer, random_unit_vector};
use crate::surface::PointCloudBackend;

/// Stage of an explosion run. Runs only move forward through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Particles are pulled into the core.
    Implode,
    /// Brief bright flash.
    Flash,
    /// Particles fly apart under drag.
    Explode,
}

/// Explosion tuning. The defaults reproduce the stock effect.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplosionSettings {
    pub particle_count: usize,
    /// Radius of the initial shell.
    pub shell_radius: RangeInclusive<f32>,
    /// Hue band of the particle colors (fractions of the color wheel).
    pub hue: RangeInclusive<f32>,
    pub saturation: f32,
    pub lightness: f32,
    /// Contraction rate while imploding, per second.
    pub implode_rate: f32,
    /// Fraction of particles that must reach the core to end the implosion.
    pub converge_ratio: f32,
    /// Per-axis distance from the origin that counts as "reached".
    pub converge_epsilon: f32,
    pub implode_timeout_secs: f32,
    pub flash_secs: f32,
    pub flash_light_intensity: f32,
    pub flash_point_size: f32,
    /// Point size while imploding.
    pub initial_point_size: f32,
    /// Point size after the flash.
    pub explode_point_size: f32,
    /// Outward speed band assigned when the flash ends.
    pub explode_speed: RangeInclusive<f32>,
    /// Velocity multiplier applied once per frame while exploding.
    pub drag: f32,
    /// Cloud rotation about the vertical axis per exploding frame, in radians.
    pub spin_per_frame: f32,
    pub explode_secs: f32,
    /// Upper bound on a single frame's time step.
    pub max_frame_dt: f32,
}

impl Default for ExplosionSettings {
    fn default() -> Self {
        Self {
            particle_count: 8000,
            shell_radius: 100.0..=200.0,
            hue: 0.5..=0.6,
            saturation: 1.0,
            lightness: 0.8,
            implode_rate: 2.0,
            converge_ratio: 0.8,
            converge_epsilon: 0.5,
            implode_timeout_secs: 1.5,
            flash_secs: 0.1,
            flash_light_intensity: 50.0,
            flash_point_size: 2.0,
            initial_point_size: 0.4,
            explode_point_size: 0.6,
            explode_speed: 20.0..=70.0,
            drag: 0.96,
            spin_per_frame: 0.002,
            explode_secs: 10.0,
            max_frame_dt: 0.1,
        }
    }
}

/// Whether a run wants more frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Running,
    /// The run is over; the last frame stays on the surface.
    Finished,
}

/// A single explosion run and its private particle buffer.
#[derive(Debug)]
pub struct ExplosionSequencer {
    settings: ExplosionSettings,
    phase: Phase,
    elapsed_in_phase: f32,
    buffer: ParticleBuffer,
    light_intensity: f32,
    point_size: f32,
    rotation_y: f32,
    finished: bool,
    rng: Pcg32,
}

impl ExplosionSequencer {
    /// Build a fresh run and upload it to `backend`.
    ///
    /// Returns `None` without touching anything else when the backend cannot
    /// draw; the explosion is simply skipped.
    pub fn start(
        settings: ExplosionSettings,
        backend: &mut impl PointCloudBackend,
        seed: u64,
    ) -> Option<Self> {
        if let Err(e) = backend.check_available() {
            warn!(error = %e, "skipping explosion");
            return None;
        }

        let mut rng = Pcg32::seed_from_u64(seed);
        let mut buffer = ParticleBuffer::new(settings.particle_count);
        for i in 0..buffer.len() {
            let radius = rng.random_range(settings.shell_radius.clone());
            buffer.set_position(i, random_unit_vector(&mut rng) * radius);
            let hue = rng.random_range(settings.hue.clone());
            buffer.set_color(i, hsl_to_rgb(hue, settings.saturation, settings.lightness));
        }

        let run = Self {
            phase: Phase::Implode,
            elapsed_in_phase: 0.0,
            buffer,
            light_intensity: 0.0,
            point_size: settings.initial_point_size,
            rotation_y: 0.0,
            finished: false,
            rng,
            settings,
        };

        backend.clear();
        backend.upload(run.buffer.positions(), run.buffer.colors());
        backend.set_point_size(run.point_size);
        backend.set_light_intensity(run.light_intensity);
        backend.set_rotation_y(run.rotation_y);
        info!(particles = run.buffer.len(), "explosion started");
        Some(run)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed_in_phase(&self) -> f32 {
        self.elapsed_in_phase
    }

    pub fn buffer(&self) -> &ParticleBuffer {
        &self.buffer
    }

    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Replace a bad or oversized frame delta with something safe to integrate.
    pub fn clamp_dt(&self, dt: f32) -> f32 {
        if dt.is_finite() {
            dt.clamp(0.0, self.settings.max_frame_dt)
        } else {
            0.0
        }
    }

    /// Advance one frame by `dt` seconds and redraw through `backend`.
    pub fn step(&mut self, dt: f32, backend: &mut impl PointCloudBackend) -> StepOutcome {
        if self.finished {
            return StepOutcome::Finished;
        }
        let dt = self.clamp_dt(dt);
        self.elapsed_in_phase += dt;

        match self.phase {
            Phase::Implode => self.implode(dt),
            Phase::Flash => self.flash(),
            Phase::Explode => self.explode(dt),
        }

        backend.update_positions(self.buffer.positions());
        backend.set_point_size(self.point_size);
        backend.set_light_intensity(self.light_intensity);
        backend.set_rotation_y(self.rotation_y);
        backend.render();

        if self.phase == Phase::Explode && self.elapsed_in_phase > self.settings.explode_secs {
            self.finished = true;
            info!("explosion finished");
            return StepOutcome::Finished;
        }
        StepOutcome::Running
    }

    fn enter(&mut self, phase: Phase) {
        debug_assert!(phase > self.phase);
        debug!(from = ?self.phase, to = ?phase, "explosion phase");
        self.phase = phase;
        self.elapsed_in_phase = 0.0;
    }

    fn implode(&mut self, dt: f32) {
        let pull = self.settings.implode_rate * dt;
        self.buffer.for_each_position(|p| *p -= *p * pull);

        let arrived = self.buffer.count_within(self.settings.converge_epsilon);
        let needed = self.settings.converge_ratio * self.buffer.len() as f32;
        if arrived as f32 >= needed || self.elapsed_in_phase > self.settings.implode_timeout_secs {
            self.enter(Phase::Flash);
        }
    }

    fn flash(&mut self) {
        self.light_intensity = self.settings.flash_light_intensity;
        self.point_size = self.settings.flash_point_size;
        if self.elapsed_in_phase <= self.settings.flash_secs {
            return;
        }

        for i in 0..self.buffer.len() {
            let speed = self.rng.random_range(self.settings.explode_speed.clone());
            let velocity = random_unit_vector(&mut self.rng) * speed;
            self.buffer.set_velocity(i, velocity);
        }
        self.light_intensity = 0.0;
        self.point_size = self.settings.explode_point_size;
        self.enter(Phase::Explode);
    }

    fn explode(&mut self, dt: f32) {
        // Drag is per frame, not per second: faster displays slow down sooner.
        let drag = self.settings.drag;
        self.buffer.for_each_motion(|p, v| {
            *p += *v * dt;
            *v *= drag;
        });
        self.rotation_y += self.settings.spin_per_frame;
    }
}

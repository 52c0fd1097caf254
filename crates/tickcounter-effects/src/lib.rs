//! Animated effects for the tickcounter countdown.
//!
//! A warp-speed starfield runs behind the display for the whole session; when
//! a countdown reaches its target an implode/flash/explode particle burst
//! plays on top of it. Both render through small backend traits
//! ([`LineSurface`], [`PointCloudBackend`]) with software implementations
//! that draw into the terminal using half-block cells.

mod camera;
mod chars;
mod color;
mod explosion;
mod particles;
mod points;
mod raster;
mod renderer;
mod starfield;
mod surface;

pub use camera::{Camera, Projected};
pub use chars::{PIXELS_PER_CELL, UPPER_HALF};
pub use color::{Rgb, hsl_to_rgb};
pub use explosion::{ExplosionSequencer, ExplosionSettings, Phase, StepOutcome};
pub use particles::{ParticleBuffer, random_unit_vector};
pub use points::SoftwarePointRenderer;
pub use raster::{Layers, Raster};
pub use renderer::Renderer;
pub use starfield::{Star, StarfieldAnimator, StarfieldSettings};
pub use surface::{LineSurface, PointCloudBackend, RenderError, Stroke};

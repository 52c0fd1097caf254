//! Drawing backends consumed by the effects.
//!
//! The starfield only needs stroked line segments; the explosion needs a
//! point-cloud renderer with additive blending and a point light. Both are
//! traits so the physics can run against a recording backend in tests.

use std::fmt;

use glam::Vec2;

use crate::camera::Camera;
use crate::color::Rgb;

/// Style of one stroked segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    /// Line width in pixels.
    pub width: f32,
    /// Opacity in `0.0..=1.0`.
    pub alpha: f32,
}

/// A 2-D surface that retains its contents between frames.
pub trait LineSurface {
    /// Size in pixels.
    fn size(&self) -> (u32, u32);

    /// Resize, discarding the current contents.
    fn resize(&mut self, width: u32, height: u32);

    /// Blend the whole surface toward `color` by `alpha`.
    fn fade(&mut self, color: Rgb, alpha: f32);

    /// Stroke a segment between two pixel positions.
    fn stroke_line(&mut self, from: Vec2, to: Vec2, stroke: Stroke);
}

/// Raised when a backend cannot draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Disabled by configuration.
    Disabled,
    /// Surface has no pixels.
    EmptySurface,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "point-cloud rendering is disabled"),
            Self::EmptySurface => write!(f, "point-cloud surface has zero area"),
        }
    }
}

impl std::error::Error for RenderError {}

/// A point-cloud renderer in the style of a GPU points pipeline.
///
/// Positions and colors are flat `x, y, z` / `r, g, b` arrays, three scalars
/// per particle.
pub trait PointCloudBackend {
    /// `Ok` when the backend can draw right now.
    fn check_available(&self) -> Result<(), RenderError>;

    fn resize(&mut self, width: u32, height: u32);

    fn set_camera(&mut self, camera: &Camera);

    /// Replace the cloud. Colors are kept until the next upload.
    fn upload(&mut self, positions: &[f32], colors: &[f32]);

    /// Refresh positions of the current cloud.
    fn update_positions(&mut self, positions: &[f32]);

    fn set_point_size(&mut self, size: f32);

    fn set_light_intensity(&mut self, intensity: f32);

    /// Rotation of the whole cloud about the vertical axis, in radians.
    fn set_rotation_y(&mut self, radians: f32);

    /// Draw the current cloud, replacing the previous frame.
    fn render(&mut self);

    /// Remove the cloud and blank the surface.
    fn clear(&mut self);
}

//! Surface ownership and resize handling.

use tracing::debug;

use crate::camera::Camera;
use crate::explosion::{ExplosionSequencer, StepOutcome};
use crate::starfield::StarfieldAnimator;
use crate::surface::{LineSurface, PointCloudBackend};

/// Owns the starfield surface, the point-cloud backend and the camera, and
/// keeps their sizes in agreement.
#[derive(Debug)]
pub struct Renderer<S, P> {
    width: u32,
    height: u32,
    stars: S,
    points: P,
    camera: Camera,
}

impl<S: LineSurface, P: PointCloudBackend> Renderer<S, P> {
    pub fn new(stars: S, points: P) -> Self {
        let (width, height) = stars.size();
        let mut renderer = Self {
            width,
            height,
            stars,
            points,
            camera: Camera::default(),
        };
        renderer.apply_size();
        renderer
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn stars(&self) -> &S {
        &self.stars
    }

    pub fn points(&self) -> &P {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut P {
        &mut self.points
    }

    /// Resize both surfaces, refresh the camera and regenerate the starfield.
    ///
    /// Returns `false` when the size is unchanged and nothing was done. A
    /// running explosion is left alone; it picks up the new camera on its
    /// next frame.
    pub fn resize(&mut self, width: u32, height: u32, starfield: &mut StarfieldAnimator) -> bool {
        let populated = starfield.stars().len() == starfield.settings().count;
        if (width, height) == (self.width, self.height) && populated {
            return false;
        }
        self.width = width;
        self.height = height;
        self.apply_size();
        starfield.regenerate(width, height);
        debug!(width, height, aspect = self.camera.aspect, "surfaces resized");
        true
    }

    fn apply_size(&mut self) {
        self.stars.resize(self.width, self.height);
        self.points.resize(self.width, self.height);
        self.camera.set_viewport(self.width, self.height);
        self.points.set_camera(&self.camera);
    }

    /// Draw one frame of the starfield.
    pub fn draw_starfield(&mut self, starfield: &mut StarfieldAnimator) {
        starfield.frame(&mut self.stars);
    }

    /// Advance an explosion run by one frame on the point-cloud backend.
    pub fn draw_explosion(&mut self, run: &mut ExplosionSequencer, dt: f32) -> StepOutcome {
        run.step(dt, &mut self.points)
    }
}

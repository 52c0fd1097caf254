//! Perspective camera for the point cloud.

use glam::{Vec2, Vec3};

/// A perspective camera looking down -Z from `position`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    /// `1 / tan(fov / 2)`, refreshed by [`Camera::update_projection`].
    focal: f32,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            fov_y_deg: 75.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 50.0),
            focal: 1.0,
        };
        camera.update_projection();
        camera
    }
}

/// A world point mapped onto the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    /// Pixel position, origin top-left.
    pub screen: Vec2,
    /// Distance in front of the camera.
    pub depth: f32,
}

impl Camera {
    /// Set the aspect ratio from a surface size and refresh the projection.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        self.update_projection();
    }

    pub fn update_projection(&mut self) {
        let half = (self.fov_y_deg.to_radians() * 0.5).tan();
        self.focal = if half > 0.0 { 1.0 / half } else { 1.0 };
    }

    /// Project `world` onto a `width` x `height` surface. `None` when outside
    /// the near/far range.
    pub fn project(&self, world: Vec3, width: u32, height: u32) -> Option<Projected> {
        let view = world - self.position;
        let depth = -view.z;
        if depth < self.near || depth > self.far {
            return None;
        }
        let ndc_x = view.x * self.focal / self.aspect / depth;
        let ndc_y = view.y * self.focal / depth;
        let screen = Vec2::new(
            (ndc_x + 1.0) * 0.5 * width as f32,
            (1.0 - ndc_y) * 0.5 * height as f32,
        );
        Some(Projected { screen, depth })
    }

    /// Screen-space diameter, in pixels, of a point of world `size` at
    /// `depth` on a surface `height` pixels tall (size attenuation).
    pub fn point_diameter(&self, size: f32, depth: f32, height: u32) -> f32 {
        if depth <= 0.0 {
            return 0.0;
        }
        size * (height as f32 * 0.5) / depth
    }
}

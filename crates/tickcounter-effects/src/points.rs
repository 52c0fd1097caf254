//! Software point-cloud renderer with additive blending.

use glam::{Quat, Vec3};

use crate::camera::Camera;
use crate::color::Rgb;
use crate::raster::Raster;
use crate::surface::{LineSurface, PointCloudBackend, RenderError};

/// Material opacity applied to every point.
const OPACITY: f32 = 0.8;

/// Light intensity that produces a full-strength flash glow.
const FULL_FLASH_INTENSITY: f32 = 50.0;

/// Draws a particle cloud into its own [`Raster`].
#[derive(Debug)]
pub struct SoftwarePointRenderer {
    enabled: bool,
    raster: Raster,
    camera: Camera,
    positions: Vec<f32>,
    colors: Vec<f32>,
    point_size: f32,
    light_intensity: f32,
    rotation_y: f32,
}

impl SoftwarePointRenderer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            raster: Raster::default(),
            camera: Camera::default(),
            positions: Vec::new(),
            colors: Vec::new(),
            point_size: 1.0,
            light_intensity: 0.0,
            rotation_y: 0.0,
        }
    }

    /// The last rendered frame.
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn particle_count(&self) -> usize {
        self.positions.len() / 3
    }

    fn splat(&mut self, world: Vec3, color: Rgb) {
        let (width, height) = (self.raster.width(), self.raster.height());
        let Some(p) = self.camera.project(world, width, height) else {
            return;
        };
        let diameter = self.camera.point_diameter(self.point_size, p.depth, height);
        let color = color * OPACITY;
        if diameter <= 1.0 {
            // Sub-pixel points deposit light proportional to their size.
            self.raster.add(
                p.screen.x.floor() as i64,
                p.screen.y.floor() as i64,
                color * diameter.max(0.1),
            );
            return;
        }
        let radius = diameter * 0.5;
        let r = radius.ceil() as i64;
        let (cx, cy) = (p.screen.x, p.screen.y);
        for dy in -r..=r {
            for dx in -r..=r {
                let px = cx.floor() as i64 + dx;
                let py = cy.floor() as i64 + dy;
                let ox = px as f32 + 0.5 - cx;
                let oy = py as f32 + 0.5 - cy;
                if ox * ox + oy * oy <= radius * radius {
                    self.raster.add(px, py, color);
                }
            }
        }
    }

    /// Radial white glow around the light at the origin.
    fn glow(&mut self) {
        let strength = (self.light_intensity / FULL_FLASH_INTENSITY).clamp(0.0, 1.0);
        if strength <= 0.0 {
            return;
        }
        let (width, height) = (self.raster.width(), self.raster.height());
        let Some(center) = self.camera.project(Vec3::ZERO, width, height) else {
            return;
        };
        let reach = width.max(height) as f32 * 0.5;
        for y in 0..height {
            for x in 0..width {
                let dx = x as f32 + 0.5 - center.screen.x;
                let dy = y as f32 + 0.5 - center.screen.y;
                let falloff = 1.0 - (dx * dx + dy * dy).sqrt() / reach;
                if falloff > 0.0 {
                    self.raster
                        .add(x as i64, y as i64, Rgb::WHITE * (falloff * falloff * strength));
                }
            }
        }
    }
}

impl PointCloudBackend for SoftwarePointRenderer {
    fn check_available(&self) -> Result<(), RenderError> {
        if !self.enabled {
            return Err(RenderError::Disabled);
        }
        if self.raster.width() == 0 || self.raster.height() == 0 {
            return Err(RenderError::EmptySurface);
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.raster.resize(width, height);
    }

    fn set_camera(&mut self, camera: &Camera) {
        self.camera = *camera;
    }

    fn upload(&mut self, positions: &[f32], colors: &[f32]) {
        self.positions = positions.to_vec();
        self.colors = colors.to_vec();
    }

    fn update_positions(&mut self, positions: &[f32]) {
        if positions.len() == self.positions.len() {
            self.positions.copy_from_slice(positions);
        }
    }

    fn set_point_size(&mut self, size: f32) {
        self.point_size = size;
    }

    fn set_light_intensity(&mut self, intensity: f32) {
        self.light_intensity = intensity;
    }

    fn set_rotation_y(&mut self, radians: f32) {
        self.rotation_y = radians;
    }

    fn render(&mut self) {
        self.raster.clear();
        let rotation = Quat::from_rotation_y(self.rotation_y);
        let positions = std::mem::take(&mut self.positions);
        for (i, p) in positions.chunks_exact(3).enumerate() {
            let c = &self.colors[i * 3..i * 3 + 3];
            let world = rotation * Vec3::from_slice(p);
            self.splat(world, Rgb::new(c[0], c[1], c[2]));
        }
        self.positions = positions;
        self.glow();
    }

    fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.light_intensity = 0.0;
        self.rotation_y = 0.0;
        self.raster.clear();
    }
}

//! Warp-speed starfield with motion trails (stateful).

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use tracing::debug;

use crate::color::Rgb;
use crate::surface::{LineSurface, Stroke};

/// Trail color.
const STAR_COLOR: Rgb = Rgb::from_u8(100, 200, 255);

/// Per-frame fill that leaves an afterimage instead of clearing.
const TRAIL_FILL: Rgb = Rgb::from_u8(5, 5, 10);
const TRAIL_FILL_ALPHA: f32 = 0.4;

/// Widest stroke, reached as a star arrives at the eye.
const MAX_STROKE_WIDTH: f32 = 2.0;

/// State for a single star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    /// Horizontal offset from the center, in pixels at unit depth.
    pub x: f32,
    /// Vertical offset from the center.
    pub y: f32,
    /// Current depth; counts down toward the viewer.
    pub z: f32,
    /// Depth at the previous frame, the start of the trail.
    pub pz: f32,
}

/// Starfield tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarfieldSettings {
    pub count: usize,
    /// Depth removed from every star per rendered frame.
    pub speed: f32,
}

impl Default for StarfieldSettings {
    fn default() -> Self {
        Self {
            count: 300,
            speed: 15.0,
        }
    }
}

/// The continuously looping starfield.
#[derive(Debug)]
pub struct StarfieldAnimator {
    settings: StarfieldSettings,
    stars: Vec<Star>,
    width: f32,
    height: f32,
    rng: Pcg32,
}

impl StarfieldAnimator {
    /// Create an empty starfield; [`Self::regenerate`] populates it.
    pub fn new(settings: StarfieldSettings, seed: u64) -> Self {
        Self {
            settings,
            stars: Vec::with_capacity(settings.count),
            width: 0.0,
            height: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn settings(&self) -> StarfieldSettings {
        self.settings
    }

    /// Rebuild the projection parameters and the whole population for a new
    /// surface size. Stars are regenerated rather than rescaled so none carry
    /// positions computed for the old aspect ratio.
    pub fn regenerate(&mut self, width: u32, height: u32) {
        self.width = width as f32;
        self.height = height as f32;
        self.stars.clear();
        for _ in 0..self.settings.count {
            let mut star = Star {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                pz: 0.0,
            };
            self.scatter(&mut star);
            // Initial depth anywhere in (0, width].
            star.z = self.width * (1.0 - self.rng.random::<f32>());
            star.pz = star.z;
            self.stars.push(star);
        }
        debug!(width, height, count = self.stars.len(), "starfield regenerated");
    }

    fn scatter(&mut self, star: &mut Star) {
        star.x = (self.rng.random::<f32>() - 0.5) * self.width;
        star.y = (self.rng.random::<f32>() - 0.5) * self.height;
    }

    fn advance(&mut self, star: &mut Star) {
        star.z -= self.settings.speed;
        if star.z <= 0.0 {
            self.scatter(star);
            star.z = self.width;
            star.pz = star.z;
        }
    }

    /// Project a star; returns the trail `(start, end)` in pixels.
    fn project(&self, star: &Star) -> (Vec2, Vec2) {
        let center = Vec2::new(self.width / 2.0, self.height / 2.0);
        let end = Vec2::new(
            star.x / star.z * self.width,
            star.y / star.z * self.height,
        ) + center;
        let start = Vec2::new(
            star.x / star.pz * self.width,
            star.y / star.pz * self.height,
        ) + center;
        (start, end)
    }

    fn visible(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Run one frame: fade the surface, move each star and stroke its trail.
    pub fn frame(&mut self, surface: &mut impl LineSurface) {
        if self.width <= 0.0 || self.height <= 0.0 {
            return;
        }
        surface.fade(TRAIL_FILL, TRAIL_FILL_ALPHA);

        for i in 0..self.stars.len() {
            let mut star = self.stars[i];
            self.advance(&mut star);
            let (start, end) = self.project(&star);
            star.pz = star.z;
            self.stars[i] = star;

            // Off-screen stars keep flying; they are only skipped for drawing.
            if !self.visible(end) {
                continue;
            }
            let closeness = 1.0 - star.z / self.width;
            surface.stroke_line(
                start,
                end,
                Stroke {
                    color: STAR_COLOR,
                    width: closeness * MAX_STROKE_WIDTH,
                    alpha: closeness,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records draw calls instead of rasterizing.
    #[derive(Default)]
    struct Recorder {
        size: (u32, u32),
        fades: Vec<(Rgb, f32)>,
        strokes: Vec<(Vec2, Vec2, Stroke)>,
    }

    impl LineSurface for Recorder {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }

        fn fade(&mut self, color: Rgb, alpha: f32) {
            self.fades.push((color, alpha));
        }

        fn stroke_line(&mut self, from: Vec2, to: Vec2, stroke: Stroke) {
            self.strokes.push((from, to, stroke));
        }
    }

    fn field(width: u32, height: u32) -> StarfieldAnimator {
        let mut field = StarfieldAnimator::new(StarfieldSettings::default(), 42);
        field.regenerate(width, height);
        field
    }

    #[test]
    fn test_population_and_depth_range() {
        let field = field(200, 100);
        assert_eq!(field.stars().len(), 300);
        for star in field.stars() {
            assert!(star.z > 0.0 && star.z <= 200.0);
            assert_eq!(star.z, star.pz);
            assert!(star.x >= -100.0 && star.x < 100.0);
            assert!(star.y >= -50.0 && star.y < 50.0);
        }
    }

    #[test]
    fn test_population_survives_resizes() {
        let mut field = field(200, 100);
        for (w, h) in [(80, 48), (1, 1), (400, 30), (200, 100)] {
            field.regenerate(w, h);
            assert_eq!(field.stars().len(), 300);
            assert!(field.stars().iter().all(|s| s.z <= w as f32));
        }
    }

    #[test]
    fn test_star_resets_at_far_plane() {
        let mut field = field(200, 100);
        field.stars[0] = Star {
            x: 1.0,
            y: 1.0,
            z: 10.0,
            pz: 25.0,
        };
        let mut surface = Recorder::default();
        field.frame(&mut surface);
        let star = field.stars()[0];
        assert_eq!(star.z, 200.0);
        assert_eq!(star.pz, 200.0);
    }

    #[test]
    fn test_depth_decrements_per_frame() {
        let mut field = field(200, 100);
        field.stars[0] = Star {
            x: 0.0,
            y: 0.0,
            z: 100.0,
            pz: 100.0,
        };
        let mut surface = Recorder::default();
        field.frame(&mut surface);
        let star = field.stars()[0];
        assert_eq!(star.z, 85.0);
        // pz catches up after projecting.
        assert_eq!(star.pz, 85.0);
        assert_eq!(surface.fades, vec![(TRAIL_FILL, TRAIL_FILL_ALPHA)]);
    }

    #[test]
    fn test_trail_projection_and_style() {
        let mut field = field(200, 100);
        field.stars.truncate(1);
        field.stars[0] = Star {
            x: 10.0,
            y: -5.0,
            z: 115.0,
            pz: 115.0,
        };
        let mut surface = Recorder::default();
        field.frame(&mut surface);

        let (from, to, stroke) = surface.strokes[0];
        assert!((from - Vec2::new(10.0 / 115.0 * 200.0 + 100.0, -5.0 / 115.0 * 100.0 + 50.0)).length() < 1e-3);
        assert!((to - Vec2::new(10.0 / 100.0 * 200.0 + 100.0, -5.0 / 100.0 * 100.0 + 50.0)).length() < 1e-3);
        assert!((stroke.alpha - 0.5).abs() < 1e-6);
        assert!((stroke.width - 1.0).abs() < 1e-6);
        assert_eq!(stroke.color, STAR_COLOR);
    }

    #[test]
    fn test_offscreen_stars_are_skipped_not_reset() {
        let mut field = field(200, 100);
        field.stars.truncate(1);
        field.stars[0] = Star {
            x: 90.0,
            y: 0.0,
            z: 30.0,
            pz: 30.0,
        };
        let mut surface = Recorder::default();
        field.frame(&mut surface);
        assert!(surface.strokes.is_empty());
        assert_eq!(field.stars()[0].z, 15.0);
        assert_eq!(field.stars()[0].x, 90.0);
    }

    #[test]
    fn test_empty_surface_draws_nothing() {
        let mut field = StarfieldAnimator::new(StarfieldSettings::default(), 1);
        let mut surface = Recorder::default();
        field.frame(&mut surface);
        assert!(surface.fades.is_empty());
    }
}

//! Software framebuffer drawn into the terminal with half-block cells.

use glam::Vec2;
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use crate::chars::{PIXELS_PER_CELL, UPPER_HALF};
use crate::color::Rgb;
use crate::surface::{LineSurface, Stroke};

/// An RGB pixel grid that keeps its contents between frames.
#[derive(Debug, Clone, Default)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb::BLACK; width as usize * height as usize],
        }
    }

    /// Pixel size matching a terminal area of `cols` x `rows` cells.
    pub fn size_for_cells(cols: u16, rows: u16) -> (u32, u32) {
        (cols as u32, rows as u32 * PIXELS_PER_CELL as u32)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Rgb::BLACK);
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        self.index(x as i64, y as i64).map(|i| self.pixels[i])
    }

    /// Alpha-blend `color` onto a pixel. Out-of-bounds writes are dropped.
    pub fn blend(&mut self, x: i64, y: i64, color: Rgb, alpha: f32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = self.pixels[i].lerp(color, alpha);
        }
    }

    /// Add `color` onto a pixel (additive blending).
    pub fn add(&mut self, x: i64, y: i64, color: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = self.pixels[i] + color;
        }
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Composite: this raster with `overlay` added on top.
    pub fn with_overlay<'a>(&'a self, overlay: Option<&'a Raster>) -> Layers<'a> {
        Layers {
            base: self,
            overlay,
        }
    }

    fn sample(&self, overlay: Option<&Raster>, x: u32, y: u32) -> Rgb {
        let base = self.get(x, y).unwrap_or_default();
        match overlay.and_then(|o| o.get(x, y)) {
            Some(top) => base + top,
            None => base,
        }
    }
}

impl LineSurface for Raster {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![Rgb::BLACK; width as usize * height as usize];
    }

    fn fade(&mut self, color: Rgb, alpha: f32) {
        for px in &mut self.pixels {
            *px = px.lerp(color, alpha);
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, stroke: Stroke) {
        if !(from.is_finite() && to.is_finite()) || stroke.alpha <= 0.0 {
            return;
        }
        // Thin lines are drawn one pixel wide with proportionally less ink.
        let brush = stroke.width.max(1.0).round() as i64;
        let alpha = stroke.alpha.clamp(0.0, 1.0) * stroke.width.clamp(0.0, 1.0).max(0.25);
        let offset = (brush - 1) / 2;

        let delta = to - from;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as usize;
        // Long segments from stars very close to the eye are capped.
        let steps = steps.min((self.width + self.height) as usize * 2);
        for step in 0..=steps {
            let p = from + delta * (step as f32 / steps as f32);
            let (cx, cy) = (p.x.floor() as i64, p.y.floor() as i64);
            for dy in 0..brush {
                for dx in 0..brush {
                    self.blend(cx + dx - offset, cy + dy - offset, stroke.color, alpha);
                }
            }
        }
    }
}

/// Base raster plus an optional additive overlay, ready to draw.
#[derive(Debug, Clone, Copy)]
pub struct Layers<'a> {
    base: &'a Raster,
    overlay: Option<&'a Raster>,
}

impl Widget for Layers<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                let x = col as u32;
                let top_y = row as u32 * PIXELS_PER_CELL as u32;
                let top = self.base.sample(self.overlay, x, top_y);
                let bottom = self.base.sample(self.overlay, x, top_y + 1);
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_char(UPPER_HALF)
                        .set_fg(top.to_color())
                        .set_bg(bottom.to_color());
                }
            }
        }
    }
}

impl Widget for &Raster {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.with_overlay(None).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    const CYAN: Rgb = Rgb::new(0.4, 0.8, 1.0);

    fn stroke(width: f32, alpha: f32) -> Stroke {
        Stroke {
            color: CYAN,
            width,
            alpha,
        }
    }

    #[test]
    fn test_cell_sizing() {
        assert_eq!(Raster::size_for_cells(80, 24), (80, 48));
    }

    #[test]
    fn test_fade_converges_to_fill() {
        let mut raster = Raster::new(4, 4);
        raster.stroke_line(Vec2::new(0.0, 0.0), Vec2::new(3.0, 3.0), stroke(1.0, 1.0));
        let fill = Rgb::from_u8(5, 5, 10);
        for _ in 0..40 {
            raster.fade(fill, 0.4);
        }
        let px = raster.get(1, 1).unwrap();
        assert!((px.b - fill.b).abs() < 1e-3);
        assert!((px.r - fill.r).abs() < 1e-3);
    }

    #[test]
    fn test_line_touches_endpoints() {
        let mut raster = Raster::new(10, 10);
        raster.stroke_line(Vec2::new(1.0, 1.0), Vec2::new(8.0, 5.0), stroke(1.0, 1.0));
        assert_eq!(raster.get(1, 1), Some(CYAN));
        assert_eq!(raster.get(8, 5), Some(CYAN));
        assert_eq!(raster.get(8, 1), Some(Rgb::BLACK));
    }

    #[test]
    fn test_out_of_bounds_is_clipped() {
        let mut raster = Raster::new(5, 5);
        raster.stroke_line(Vec2::new(-20.0, -20.0), Vec2::new(50.0, 50.0), stroke(3.0, 1.0));
        raster.blend(-1, 2, CYAN, 1.0);
        raster.add(9, 9, CYAN);
        assert_eq!(raster.get(2, 2), Some(CYAN));
        assert_eq!(raster.get(5, 5), None);
    }

    #[test]
    fn test_thin_faint_lines_blend_partially() {
        let mut raster = Raster::new(3, 3);
        raster.stroke_line(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0), stroke(0.5, 0.5));
        let px = raster.get(1, 1).unwrap();
        assert!(px.b > 0.0 && px.b < CYAN.b);
    }

    #[test]
    fn test_non_finite_stroke_is_ignored() {
        let mut raster = Raster::new(3, 3);
        raster.stroke_line(Vec2::new(f32::NAN, 0.0), Vec2::ONE, stroke(1.0, 1.0));
        assert!(raster.pixels.iter().all(|p| *p == Rgb::BLACK));
    }

    #[test]
    fn test_widget_uses_half_blocks_and_overlay() {
        let mut base = Raster::new(2, 2);
        base.blend(0, 0, Rgb::new(1.0, 0.0, 0.0), 1.0);
        let mut overlay = Raster::new(2, 2);
        overlay.add(0, 1, Rgb::new(0.0, 0.0, 1.0));

        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        base.with_overlay(Some(&overlay)).render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 255));
    }
}

//! Linear RGB colors and conversions.

use std::ops::{Add, Mul};

use ratatui::style::Color;

/// An RGB color with channels in `0.0..=1.0` (may exceed 1.0 while
/// accumulating additive light; clamped on output).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from 8-bit channels.
    pub const fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Linear interpolation toward `other`; `t = 1` yields `other`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        self * (1.0 - t) + other * t
    }

    pub fn clamped(self) -> Rgb {
        Rgb::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }

    pub fn to_color(self) -> Color {
        let c = self.clamped();
        Color::Rgb(
            (c.r * 255.0).round() as u8,
            (c.g * 255.0).round() as u8,
            (c.b * 255.0).round() as u8,
        )
    }
}

impl Add for Rgb {
    type Output = Rgb;

    fn add(self, rhs: Rgb) -> Rgb {
        Rgb::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl Mul<f32> for Rgb {
    type Output = Rgb;

    fn mul(self, rhs: f32) -> Rgb {
        Rgb::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

/// Convert HSL to RGB. All three inputs are fractions in `0.0..=1.0`
/// (hue `0.5` is cyan).
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Rgb {
    if s == 0.0 {
        return Rgb::new(l, l, l);
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;
    let h = h.rem_euclid(1.0);

    Rgb::new(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-4 && (a.g - b.g).abs() < 1e-4 && (a.b - b.b).abs() < 1e-4
    }

    #[test]
    fn test_hsl_primaries() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), Rgb::new(1.0, 0.0, 0.0)));
        assert!(close(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), Rgb::new(0.0, 1.0, 0.0)));
        assert!(close(hsl_to_rgb(0.5, 1.0, 0.5), Rgb::new(0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_light_cyan_band() {
        // Explosion palette: hue 0.5..0.6, full saturation, lightness 0.8.
        let c = hsl_to_rgb(0.5, 1.0, 0.8);
        assert!(close(c, Rgb::new(0.6, 1.0, 1.0)));
        let c = hsl_to_rgb(0.6, 1.0, 0.8);
        assert!(c.b > c.g && c.g > c.r);
    }

    #[test]
    fn test_grayscale() {
        assert_eq!(hsl_to_rgb(0.3, 0.0, 0.25), Rgb::new(0.25, 0.25, 0.25));
    }

    #[test]
    fn test_to_color_clamps() {
        assert_eq!(Rgb::new(2.0, -1.0, 0.5).to_color(), Color::Rgb(255, 0, 128));
    }

    #[test]
    fn test_lerp() {
        let mid = Rgb::BLACK.lerp(Rgb::WHITE, 0.5);
        assert!(close(mid, Rgb::new(0.5, 0.5, 0.5)));
        assert_eq!(Rgb::BLACK.lerp(Rgb::WHITE, 2.0), Rgb::WHITE);
    }
}

//! Fixed-size particle storage.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use crate::color::Rgb;

/// Parallel position / velocity / color arrays, three scalars per particle.
///
/// The arrays are boxed slices: their length is fixed at construction and
/// cannot change for the buffer's lifetime.
#[derive(Debug, Clone)]
pub struct ParticleBuffer {
    positions: Box<[f32]>,
    velocities: Box<[f32]>,
    colors: Box<[f32]>,
}

impl ParticleBuffer {
    /// A buffer of `count` particles at the origin, at rest, black.
    pub fn new(count: usize) -> Self {
        Self {
            positions: vec![0.0; count * 3].into_boxed_slice(),
            velocities: vec![0.0; count * 3].into_boxed_slice(),
            colors: vec![0.0; count * 3].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[i * 3..i * 3 + 3])
    }

    pub fn velocity(&self, i: usize) -> Vec3 {
        Vec3::from_slice(&self.velocities[i * 3..i * 3 + 3])
    }

    pub fn color(&self, i: usize) -> Rgb {
        let c = &self.colors[i * 3..i * 3 + 3];
        Rgb::new(c[0], c[1], c[2])
    }

    pub fn set_position(&mut self, i: usize, p: Vec3) {
        p.write_to_slice(&mut self.positions[i * 3..i * 3 + 3]);
    }

    pub fn set_velocity(&mut self, i: usize, v: Vec3) {
        v.write_to_slice(&mut self.velocities[i * 3..i * 3 + 3]);
    }

    pub fn set_color(&mut self, i: usize, c: Rgb) {
        self.colors[i * 3..i * 3 + 3].copy_from_slice(&[c.r, c.g, c.b]);
    }

    /// Apply `f` to every position in place.
    pub fn for_each_position(&mut self, mut f: impl FnMut(&mut Vec3)) {
        for chunk in self.positions.chunks_exact_mut(3) {
            let mut p = Vec3::from_slice(chunk);
            f(&mut p);
            p.write_to_slice(chunk);
        }
    }

    /// Apply `f` to every (position, velocity) pair in place.
    pub fn for_each_motion(&mut self, mut f: impl FnMut(&mut Vec3, &mut Vec3)) {
        for (pos, vel) in self
            .positions
            .chunks_exact_mut(3)
            .zip(self.velocities.chunks_exact_mut(3))
        {
            let mut p = Vec3::from_slice(pos);
            let mut v = Vec3::from_slice(vel);
            f(&mut p, &mut v);
            p.write_to_slice(pos);
            v.write_to_slice(vel);
        }
    }

    /// Number of particles with every coordinate within `epsilon` of the origin.
    pub fn count_within(&self, epsilon: f32) -> usize {
        self.positions
            .chunks_exact(3)
            .filter(|p| p.iter().all(|c| c.abs() < epsilon))
            .count()
    }
}

/// A direction drawn uniformly over the unit sphere.
///
/// `theta` is uniform around the axis; `phi = acos(2u - 1)` keeps the
/// distribution uniform in area rather than bunched at the poles.
pub fn random_unit_vector(rng: &mut impl Rng) -> Vec3 {
    let theta = rng.random_range(0.0..TAU);
    let phi = (rng.random_range(0.0..=1.0f32) * 2.0 - 1.0).acos();
    Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos())
}

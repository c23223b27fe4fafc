//! Continuous gradient noise primitive.
//!
//! Every higher-level field is built from this one function. It wraps the
//! `noise` crate's Perlin implementation with a fixed permutation so that world
//! variation comes only from coordinate offsets, never from the permutation.

use glam::DVec2;
use noise::{NoiseFn, Perlin};

/// Permutation seed for the shared Perlin table. Part of the world format.
const PERMUTATION_SEED: u32 = 0x5EED_0001;

/// Y coordinate of the horizontal slice used for 2D sampling.
///
/// Perlin noise is zero on integer lattice planes, so the slice sits between
/// them.
const SLICE_Y: f64 = 0.431;

/// Period of the Perlin lattice hash. Coordinates are wrapped into
/// `[0, LATTICE_PERIOD)` before sampling, which leaves the field unchanged.
const LATTICE_PERIOD: f64 = 256.0;

/// Maps a coordinate onto one period of the lattice. Non-finite input maps to 0.
#[inline]
fn wrap_coordinate(v: f64) -> f64 {
    if v.is_finite() { v.rem_euclid(LATTICE_PERIOD) } else { 0.0 }
}

/// A smooth deterministic scalar field over 3D space with output in `[-1, 1]`.
#[derive(Clone)]
pub struct NoiseField {
    perlin: Perlin,
}

impl NoiseField {
    pub fn new() -> Self {
        Self {
            perlin: Perlin::new(PERMUTATION_SEED),
        }
    }

    /// Sample the field at a 3D point.
    ///
    /// Any input is accepted: non-finite coordinates sample the origin and
    /// far coordinates are wrapped onto the lattice period.
    #[inline]
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let v = self
            .perlin
            .get([wrap_coordinate(x), wrap_coordinate(y), wrap_coordinate(z)]);
        if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 }
    }

    /// Sample the horizontal slice at `point * frequency + offset`.
    #[inline]
    pub fn sample_2d(&self, point: DVec2, frequency: f64, offset: DVec2) -> f64 {
        let p = point * frequency + offset;
        self.sample(p.x, SLICE_Y, p.y)
    }
}

impl Default for NoiseField {
    fn default() -> Self {
        Self::new()
    }
}

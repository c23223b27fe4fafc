//! Multi-octave fractal Brownian motion (fBm) over the shared noise field.
//!
//! Composites multiple octaves of gradient noise to produce natural-looking
//! signals with features at many spatial frequencies. Output is normalized by
//! the geometric amplitude sum, so every fractal signal lives in `[-1, 1]`.

use glam::DVec2;

use crate::noise_field::NoiseField;

/// Smallest amplitude sum treated as non-zero during normalization.
const AMPLITUDE_EPSILON: f64 = 1e-12;

/// Linear interpolation: `t = 0` returns `a`, `t = 1` returns `b`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Hermite smoothstep of `x` between `edge0` and `edge1`, in `[0, 1]`.
///
/// A degenerate band (`edge1 <= edge0`) acts as a hard step at `edge0`.
#[inline]
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let width = edge1 - edge0;
    if width <= AMPLITUDE_EPSILON {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / width).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Configuration for one fractal signal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractalParams {
    /// Number of noise octaves to composite.
    pub octaves: u32,
    /// Frequency multiplier between successive octaves. Default: 2.0.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves. Default: 0.5.
    pub persistence: f64,
    /// Frequency of the first (lowest) octave, in cycles per world unit.
    pub base_frequency: f64,
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 0.01,
        }
    }
}

impl FractalParams {
    /// Shorthand for params with default lacunarity and persistence.
    pub const fn new(octaves: u32, base_frequency: f64) -> Self {
        Self {
            octaves,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency,
        }
    }

    /// Theoretical maximum absolute sum (geometric series of amplitudes).
    pub fn max_amplitude(&self) -> f64 {
        let mut sum = 0.0;
        let mut amp = 1.0;
        for _ in 0..self.octaves {
            sum += amp;
            amp *= self.persistence;
        }
        sum
    }
}

/// Samples normalized fBm from a [`NoiseField`].
///
/// Each successive octave scales frequency by `lacunarity` and amplitude by
/// `persistence`. Octave `k` is additionally shifted by a fixed per-octave
/// offset so lattice artifacts of neighbouring octaves do not line up.
#[derive(Clone)]
pub struct FractalSampler {
    field: NoiseField,
}

impl FractalSampler {
    pub fn new(field: NoiseField) -> Self {
        Self { field }
    }

    /// The underlying noise primitive.
    pub fn field(&self) -> &NoiseField {
        &self.field
    }

    /// Sample fBm at `point` in `[-1, 1]`, with the noise space shifted by `offset`.
    pub fn sample(&self, params: &FractalParams, point: DVec2, offset: DVec2) -> f64 {
        let max_amp = params.max_amplitude();
        if max_amp < AMPLITUDE_EPSILON {
            return 0.0;
        }

        let mut total = 0.0;
        let mut frequency = params.base_frequency;
        let mut amplitude = 1.0;

        for octave in 0..params.octaves {
            let shift = offset + DVec2::new(octave as f64 * 19.19, octave as f64 * 7.73);
            total += self.field.sample_2d(point, frequency, shift) * amplitude;

            frequency *= params.lacunarity;
            amplitude *= params.persistence;
        }

        (total / max_amp).clamp(-1.0, 1.0)
    }

    /// Sample fBm remapped to `[0, 1]`.
    pub fn sample_unit(&self, params: &FractalParams, point: DVec2, offset: DVec2) -> f64 {
        (self.sample(params, point, offset) * 0.5 + 0.5).clamp(0.0, 1.0)
    }

    /// Like [`sample_unit`](Self::sample_unit) but with the signal scaled by
    /// `contrast` first. Normalized fBm clusters around zero; stretching it
    /// makes thresholds in `[0, 1]` cover a useful share of the world.
    pub fn sample_stretched(
        &self,
        params: &FractalParams,
        point: DVec2,
        offset: DVec2,
        contrast: f64,
    ) -> f64 {
        (self.sample(params, point, offset) * contrast * 0.5 + 0.5).clamp(0.0, 1.0)
    }
}

impl Default for FractalSampler {
    fn default() -> Self {
        Self::new(NoiseField::new())
    }
}

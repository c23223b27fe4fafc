//! Height field synthesis.
//!
//! Composes the fractal noise primitive into a single surface elevation plus
//! biome weights for any world `(x, z)`: domain warp, fractal base with
//! slope-driven detail, climate, ocean mask, ridges, biome-biased elevation,
//! river carving, plateau terracing and sea-level flattening.
//!
//! [`HeightFieldSynthesizer::evaluate`] is a pure function of its arguments.
//! Regenerating a segment from the same snapshot always reproduces it bit for
//! bit.

use glam::DVec2;

use crate::biome::{BiomeKind, BiomeWeights, ClimateTerms};
use crate::heightmap::{FractalParams, FractalSampler, lerp, smoothstep};
use crate::seed::{det_pow, det_sqrt};
use crate::world::TerrainSnapshot;

/// Lowest possible surface height, in world units.
pub const MIN_HEIGHT: f64 = -8.0;
/// Highest possible surface height, in world units.
pub const MAX_HEIGHT: f64 = 24.0;
/// Water surface height.
pub const SEA_LEVEL: f64 = 0.0;

/// Ocean weights below this leave the height untouched.
const OCEAN_EPSILON: f64 = 1e-3;
/// Floor for divisors built from tunable parameters.
const DIVISOR_EPSILON: f64 = 1e-9;

// Secondary fields reuse a primary offset shifted by a fixed amount.
const WARP_SHIFT_X: DVec2 = DVec2::new(31.7, 47.3);
const WARP_SHIFT_Z: DVec2 = DVec2::new(-53.1, 11.9);
const DETAIL_SHIFT: DVec2 = DVec2::new(211.3, -97.1);
const RANGE_SHIFT: DVec2 = DVec2::new(-401.9, 233.7);
const PEAK_SHIFT: DVec2 = DVec2::new(77.7, -311.2);
const VALLEY_SHIFT: DVec2 = DVec2::new(523.5, 619.4);

/// Tunable shaping parameters of the synthesizer.
///
/// None of these are part of the world configuration surface; changing them
/// changes every world. Gate thresholds and strengths are tuned for visual
/// plausibility.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeParams {
    /// Low-frequency fBm used for both warp axes.
    pub warp: FractalParams,
    /// Warp displacement in world units at full signal.
    pub warp_strength: f64,
    /// Macro elevation signal.
    pub macro_signal: FractalParams,
    /// Scale applied to the macro signal before mapping to `[0, 1]`.
    pub macro_contrast: f64,
    /// High-frequency detail octaves.
    pub detail: FractalParams,
    /// Detail amplitude relative to the macro signal.
    pub detail_amplitude: f64,
    /// Share of detail kept on perfectly flat ground.
    pub flat_detail_mix: f64,
    /// Central-difference step for the slope estimate, in world units.
    pub slope_step: f64,
    /// Macro gradient magnitude that counts as fully steep.
    pub slope_reference: f64,
    pub heat: FractalParams,
    pub moisture: FractalParams,
    /// Contrast applied to climate, ocean and plateau fields.
    pub field_contrast: f64,
    pub ocean: FractalParams,
    /// Half-width of the soft ocean band around the threshold.
    pub ocean_band: f64,
    /// Ocean weight at which the surface is fully flattened.
    pub ocean_full: f64,
    /// Sub-linear exponent of the sea-level blend.
    pub ocean_power: f64,
    /// Depth of the flattened sea floor below sea level.
    pub ocean_floor_depth: f64,
    pub ridge: FractalParams,
    /// Coherence exponent on the folded ridge signal.
    pub ridge_exponent: f64,
    /// Low-frequency field deciding where ranges exist at all.
    pub range: FractalParams,
    pub range_band: (f64, f64),
    pub peak: FractalParams,
    pub valley: FractalParams,
    pub valley_band: (f64, f64),
    /// How much the valley term subtracts from the mountain signal.
    pub valley_subtract: f64,
    pub plateau_mask: FractalParams,
    pub plateau_presence_band: (f64, f64),
    pub plateau_threshold: f64,
    pub plateau_min_weight: f64,
    pub plateau_step: f64,
    pub river: FractalParams,
    /// Half-width of the river band around the zero crossing.
    pub river_width: f64,
    pub river_depth: f64,
    /// Height above sea level over which river carving fades in.
    pub river_fade: f64,
    /// Lowest depth a river bed is cut to.
    pub river_bed_depth: f64,
    /// Elevation sub-range per biome, indexed by [`BiomeKind::index`].
    pub biome_ranges: [(f64, f64); 4],
    /// Dominant weight band over which the biome bias engages.
    pub biome_gate: (f64, f64),
    /// Lead over the runner-up needed for the full biome bias.
    pub biome_margin: f64,
    /// Maximum blend toward the biome's elevation sub-range.
    pub biome_strength: f64,
    /// Mountain weight below which no uplift happens.
    pub mountain_floor: f64,
    pub mountain_uplift: f64,
    pub valley_depth: f64,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            warp: FractalParams::new(2, 0.004),
            warp_strength: 14.0,
            macro_signal: FractalParams::new(5, 0.006),
            macro_contrast: 1.6,
            detail: FractalParams::new(3, 0.045),
            detail_amplitude: 0.15,
            flat_detail_mix: 0.25,
            slope_step: 0.75,
            slope_reference: 0.02,
            heat: FractalParams::new(3, 0.0025),
            moisture: FractalParams::new(3, 0.003),
            field_contrast: 2.0,
            ocean: FractalParams::new(3, 0.0018),
            ocean_band: 0.06,
            ocean_full: 0.95,
            ocean_power: 0.5,
            ocean_floor_depth: 0.4,
            ridge: FractalParams::new(4, 0.008),
            ridge_exponent: 2.5,
            range: FractalParams::new(2, 0.0022),
            range_band: (0.4, 0.7),
            peak: FractalParams::new(2, 0.04),
            valley: FractalParams::new(2, 0.003),
            valley_band: (0.55, 0.9),
            valley_subtract: 0.6,
            plateau_mask: FractalParams::new(3, 0.004),
            plateau_presence_band: (0.45, 0.7),
            plateau_threshold: 0.68,
            plateau_min_weight: 0.2,
            plateau_step: 2.0,
            river: FractalParams::new(3, 0.0035),
            river_width: 0.035,
            river_depth: 2.5,
            river_fade: 1.5,
            river_bed_depth: 0.6,
            biome_ranges: [(1.0, 6.0), (2.0, 10.0), (7.0, 14.0), (10.0, 22.0)],
            biome_gate: (0.35, 0.65),
            biome_margin: 0.15,
            biome_strength: 0.55,
            mountain_floor: 0.08,
            mountain_uplift: 11.0,
            valley_depth: 2.5,
        }
    }
}

/// Auxiliary per-point fields exposed alongside height, all in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AuxFields {
    pub heat: f64,
    pub moisture: f64,
    /// Ocean weight; 1 is open sea.
    pub ocean: f64,
    /// Proximity to the ocean band's threshold; 1 on the coastline.
    pub coast: f64,
    /// River channel strength after slope and moisture attenuation.
    pub river: f64,
    /// Normalized macro slope.
    pub slope: f64,
    /// Mountain signal (ridge × peak − valley).
    pub ridge: f64,
    /// Raw plateau mask.
    pub plateau: f64,
}

/// Everything the synthesizer knows about one surface point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSample {
    /// Surface elevation in `[MIN_HEIGHT, MAX_HEIGHT]`.
    pub height: f64,
    pub weights: BiomeWeights,
    pub aux: AuxFields,
}

impl SurfaceSample {
    /// Returns `true` if the surface lies below the water line.
    pub fn is_underwater(&self) -> bool {
        self.height < SEA_LEVEL
    }
}

/// Evaluates the height field for a configuration snapshot.
#[derive(Clone)]
pub struct HeightFieldSynthesizer {
    fbm: FractalSampler,
    params: ShapeParams,
}

impl HeightFieldSynthesizer {
    pub fn new(params: ShapeParams) -> Self {
        Self {
            fbm: FractalSampler::default(),
            params,
        }
    }

    pub fn params(&self) -> &ShapeParams {
        &self.params
    }

    fn macro_at(&self, point: DVec2, offset: DVec2) -> f64 {
        self.fbm.sample(&self.params.macro_signal, point, offset)
    }

    fn stretched(&self, params: &FractalParams, point: DVec2, offset: DVec2) -> f64 {
        self.fbm
            .sample_stretched(params, point, offset, self.params.field_contrast)
    }

    /// Evaluate the surface at world `(x, z)`.
    pub fn evaluate(&self, world_x: f64, world_z: f64, snapshot: &TerrainSnapshot) -> SurfaceSample {
        let p = &self.params;
        let offsets = snapshot.offsets();
        let biases = snapshot.biases();
        let point = DVec2::new(world_x, world_z);

        // Domain warp.
        let warp = DVec2::new(
            self.fbm.sample(&p.warp, point, offsets.height + WARP_SHIFT_X),
            self.fbm.sample(&p.warp, point, offsets.height + WARP_SHIFT_Z),
        );
        let warped = point + warp * p.warp_strength;

        // Fractal base, with detail scaled by slope.
        let macro_signal = self.macro_at(warped, offsets.height);
        let detail = self.fbm.sample(&p.detail, warped, offsets.height + DETAIL_SHIFT);

        let h = p.slope_step.max(DIVISOR_EPSILON);
        let dx = (self.macro_at(warped + DVec2::X * h, offsets.height)
            - self.macro_at(warped - DVec2::X * h, offsets.height))
            / (2.0 * h);
        let dz = (self.macro_at(warped + DVec2::Y * h, offsets.height)
            - self.macro_at(warped - DVec2::Y * h, offsets.height))
            / (2.0 * h);
        let slope =
            (det_sqrt(dx * dx + dz * dz) / p.slope_reference.max(DIVISOR_EPSILON)).clamp(0.0, 1.0);

        let detail_mix = lerp(p.flat_detail_mix, 1.0, slope);
        let base_signal =
            (macro_signal + detail * p.detail_amplitude * detail_mix).clamp(-1.0, 1.0);
        let base01 = (base_signal * p.macro_contrast * 0.5 + 0.5).clamp(0.0, 1.0);

        // Climate.
        let heat = self.stretched(&p.heat, point, offsets.heat);
        let moisture = self.stretched(&p.moisture, point, offsets.moisture);
        let climate = ClimateTerms::from_fields(heat, moisture);

        // Ocean mask and coastline.
        let ocean_field = self.stretched(&p.ocean, warped, offsets.ocean);
        let threshold = biases.ocean_threshold;
        let band = p.ocean_band.max(DIVISOR_EPSILON);
        let ocean = (1.0 - smoothstep(threshold - band, threshold + band, ocean_field)).clamp(0.0, 1.0);
        let coast = (1.0 - (ocean_field - threshold).abs() / band).clamp(0.0, 1.0);

        // Ridges, peaks and the valleys that separate ranges.
        let folded = 1.0 - self.fbm.sample(&p.ridge, warped, offsets.ridge).abs();
        let range = smoothstep(
            p.range_band.0,
            p.range_band.1,
            self.fbm.sample_unit(&p.range, point, offsets.ridge + RANGE_SHIFT),
        );
        let ridge = (det_pow(folded, p.ridge_exponent) * range).clamp(0.0, 1.0);
        let peak = 1.0 - self.fbm.sample(&p.peak, warped, offsets.ridge + PEAK_SHIFT).abs();
        let peak_term = (0.55 + 0.45 * peak * peak).clamp(0.0, 1.0);
        let valley = smoothstep(
            p.valley_band.0,
            p.valley_band.1,
            self.fbm.sample_unit(&p.valley, point, offsets.ridge + VALLEY_SHIFT),
        );
        let mountain_signal = (ridge * peak_term - valley * p.valley_subtract).clamp(0.0, 1.0);

        // Biome weights.
        let plateau_mask = self.stretched(&p.plateau_mask, point, offsets.plateau);
        let plateau_presence = smoothstep(
            p.plateau_presence_band.0,
            p.plateau_presence_band.1,
            plateau_mask,
        );
        let weights =
            BiomeWeights::from_climate(&climate, mountain_signal, plateau_presence, biases);

        // Elevation: global mapping, biome bias, uplift and valley carving.
        let mut height = lerp(MIN_HEIGHT, MAX_HEIGHT, base01);
        height = self.bias_toward_biome(height, base01, &weights);

        let uplift_gate = smoothstep(p.mountain_floor, p.mountain_floor + 0.3, weights.mountain);
        let uplift = (ridge * peak_term * uplift_gate * p.mountain_uplift).clamp(0.0, p.mountain_uplift);
        let carve = (valley * (1.0 - weights.mountain) * p.valley_depth).clamp(0.0, p.valley_depth);
        height = (height + uplift - carve).clamp(MIN_HEIGHT, MAX_HEIGHT);

        // Rivers.
        let river_field = self.fbm.sample(&p.river, warped, offsets.river);
        let channel = 1.0 - smoothstep(0.0, p.river_width, river_field.abs());
        let river = (channel * (1.0 - slope) * (0.4 + 0.6 * moisture)).clamp(0.0, 1.0);
        height = self.carve_river(height, river);

        // Plateau terraces.
        height = self.terrace(height, plateau_mask, weights.plateau);

        // Sea level.
        if ocean > OCEAN_EPSILON {
            let t = det_pow((ocean / p.ocean_full.max(DIVISOR_EPSILON)).min(1.0), p.ocean_power);
            let floor = SEA_LEVEL - p.ocean_floor_depth * (0.5 + base01);
            height = lerp(height, floor, t);
        }

        let height = if height.is_finite() {
            height.clamp(MIN_HEIGHT, MAX_HEIGHT)
        } else {
            SEA_LEVEL
        };

        SurfaceSample {
            height,
            weights,
            aux: AuxFields {
                heat,
                moisture,
                ocean,
                coast,
                river,
                slope,
                ridge: mountain_signal,
                plateau: plateau_mask,
            },
        }
    }

    /// Pull `height` toward the dominant biome's elevation sub-range.
    ///
    /// The pull is zero when the two strongest weights are equal, so switching
    /// dominant biome never causes a jump.
    fn bias_toward_biome(&self, height: f64, base01: f64, weights: &BiomeWeights) -> f64 {
        let p = &self.params;
        let (kind, top, runner_up) = weights.dominant();
        let gate = smoothstep(p.biome_gate.0, p.biome_gate.1, top)
            * smoothstep(0.0, p.biome_margin, top - runner_up);
        let (low, high) = p.biome_ranges[kind.index()];
        let target = lerp(low, high, base01);
        lerp(height, target, (gate * p.biome_strength).clamp(0.0, 1.0))
    }

    /// Cut a river channel of strength `river` into `height`. Carving fades in
    /// over `river_fade` above sea level and never digs below the river bed.
    fn carve_river(&self, height: f64, river: f64) -> f64 {
        let p = &self.params;
        let fade = smoothstep(SEA_LEVEL, SEA_LEVEL + p.river_fade, height);
        let cut = (river * fade * p.river_depth).clamp(0.0, p.river_depth);
        height.min((height - cut).max(SEA_LEVEL - p.river_bed_depth))
    }

    /// Quantize land inside strong plateau regions to `plateau_step`.
    fn terrace(&self, height: f64, plateau_mask: f64, plateau_weight: f64) -> f64 {
        let p = &self.params;
        if plateau_mask > p.plateau_threshold
            && plateau_weight > p.plateau_min_weight
            && height > SEA_LEVEL
        {
            let step = p.plateau_step.max(DIVISOR_EPSILON);
            (height / step).round() * step
        } else {
            height
        }
    }

    /// Elevation sub-range associated with a biome.
    pub fn biome_range(&self, kind: BiomeKind) -> (f64, f64) {
        self.params.biome_ranges[kind.index()]
    }
}

impl Default for HeightFieldSynthesizer {
    fn default() -> Self {
        Self::new(ShapeParams::default())
    }
}

//! Surface coloring from elevation, biome weights and climate.
//!
//! Color is chosen by absolute elevation band first; biome weights and the
//! climate fields only tint within the vegetated bands. Every input maps to a
//! finite color in `[0, 1]`.

use std::ops::{Add, Mul};

use crate::biome::{BiomeKind, BiomeWeights};
use crate::terrain_height::{AuxFields, SEA_LEVEL};

/// Upper edge of the beach sand band.
pub const BEACH_TOP: f64 = 1.0;
/// Upper edge of the plains band.
pub const PLAINS_TOP: f64 = 5.0;
/// Upper edge of the forest band.
pub const FOREST_TOP: f64 = 10.0;
/// Upper edge of the plateau band; rock starts here.
pub const PLATEAU_TOP: f64 = 14.0;
/// Height at which the rock-to-snow gradient is fully snow. Ice above.
pub const ICE_LINE: f64 = 20.0;

/// Warm tint band just above the water line.
const BEACH_TINT_LOW: f64 = SEA_LEVEL;
const BEACH_TINT_HIGH: f64 = 0.8;
const BEACH_TINT_STRENGTH: f32 = 0.6;

/// How strongly biome tint overrides the band color in vegetated bands.
const BIOME_TINT_MIX: f32 = 0.45;

/// Linear RGB color with channels nominally in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a `0xRRGGBB` literal.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Linear blend: `w = 0.0` returns `self`, `w = 1.0` returns `other`.
    pub fn lerp(self, other: Self, w: f32) -> Self {
        let w = if w.is_finite() { w.clamp(0.0, 1.0) } else { 0.0 };
        self * (1.0 - w) + other * w
    }

    /// Clamp every channel to `[0, 1]`; non-finite channels become 0.
    pub fn saturated(self) -> Self {
        let fix = |c: f32| if c.is_finite() { c.clamp(0.0, 1.0) } else { 0.0 };
        Self::new(fix(self.r), fix(self.g), fix(self.b))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Quantize to 8-bit RGBA with full alpha.
    pub fn to_rgba8(self) -> [u8; 4] {
        let c = self.saturated();
        let q = |v: f32| (v * 255.0).round() as u8;
        [q(c.r), q(c.g), q(c.b), 255]
    }
}

impl Add for Rgb {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl Mul<f32> for Rgb {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

/// Colors used by [`BiomeColorBlender`].
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub water: Rgb,
    pub sand: Rgb,
    pub warm_sand: Rgb,
    pub dry_grass: Rgb,
    pub lush_grass: Rgb,
    pub forest: Rgb,
    pub plateau: Rgb,
    pub rock: Rgb,
    pub snow: Rgb,
    pub ice: Rgb,
    /// Per-biome tint, indexed by [`BiomeKind::index`].
    pub biome_tints: [Rgb; 4],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            water: Rgb::from_hex(0x2a5d8f),
            sand: Rgb::from_hex(0xd8c98e),
            warm_sand: Rgb::from_hex(0xe8b76a),
            dry_grass: Rgb::from_hex(0x9aa457),
            lush_grass: Rgb::from_hex(0x5c9a3c),
            forest: Rgb::from_hex(0x2f6b2a),
            plateau: Rgb::from_hex(0xa8754a),
            rock: Rgb::from_hex(0x7a736b),
            snow: Rgb::from_hex(0xf2f4f7),
            ice: Rgb::from_hex(0xcfe6f5),
            biome_tints: [
                Rgb::from_hex(0xd2b47a),
                Rgb::from_hex(0x2e7d32),
                Rgb::from_hex(0xb5794a),
                Rgb::from_hex(0x8a8580),
            ],
        }
    }
}

/// Maps surface samples to colors.
#[derive(Clone, Debug, Default)]
pub struct BiomeColorBlender {
    palette: Palette,
}

impl BiomeColorBlender {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Weighted sum of the per-biome tints.
    pub fn biome_tint(&self, weights: &BiomeWeights) -> Rgb {
        let weights = weights.normalized();
        BiomeKind::ALL
            .into_iter()
            .fold(Rgb::BLACK, |acc, kind| {
                acc + self.palette.biome_tints[kind.index()] * weights.get(kind) as f32
            })
    }

    /// Color of the surface at `height`.
    ///
    /// Non-finite heights are treated as water.
    pub fn color_at(&self, height: f64, weights: &BiomeWeights, aux: &AuxFields) -> Rgb {
        let p = &self.palette;
        if !height.is_finite() || height < SEA_LEVEL {
            return p.water;
        }

        let moisture = clamp_unit(aux.moisture) as f32;
        let grass = p.dry_grass.lerp(p.lush_grass, moisture);
        let tint = self.biome_tint(weights);

        let base = if height < BEACH_TOP {
            p.sand
        } else if height < PLAINS_TOP {
            grass.lerp(tint, BIOME_TINT_MIX)
        } else if height < FOREST_TOP {
            p.forest.lerp(tint, BIOME_TINT_MIX * 0.5)
        } else if height < PLATEAU_TOP {
            p.plateau.lerp(tint, BIOME_TINT_MIX * 0.3)
        } else if height < ICE_LINE {
            let t = (height - PLATEAU_TOP) / (ICE_LINE - PLATEAU_TOP);
            p.rock.lerp(p.snow, t as f32)
        } else {
            p.ice
        };

        let beach = beach_tint_weight(height) * (0.5 + 0.5 * clamp_unit(aux.coast));
        base.lerp(p.warm_sand, beach as f32 * BEACH_TINT_STRENGTH)
            .saturated()
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

/// Tent weight peaking at the middle of the warm beach band.
fn beach_tint_weight(height: f64) -> f64 {
    let mid = 0.5 * (BEACH_TINT_LOW + BEACH_TINT_HIGH);
    let half = 0.5 * (BEACH_TINT_HIGH - BEACH_TINT_LOW);
    (1.0 - (height - mid).abs() / half).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aux() -> AuxFields {
        AuxFields {
            heat: 0.5,
            moisture: 0.5,
            ocean: 0.0,
            coast: 0.0,
            river: 0.0,
            slope: 0.0,
            ridge: 0.0,
            plateau: 0.0,
        }
    }

    fn is_valid(c: Rgb) -> bool {
        c.to_array().iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v))
    }

    #[test]
    fn test_below_sea_level_is_water() {
        let blender = BiomeColorBlender::default();
        let w = BiomeWeights::UNIFORM;
        assert_eq!(blender.color_at(-0.01, &w, &aux()), blender.palette().water);
        assert_eq!(blender.color_at(-7.5, &w, &aux()), blender.palette().water);
    }

    #[test]
    fn test_water_has_no_depth_gradient() {
        let blender = BiomeColorBlender::default();
        let w = BiomeWeights::UNIFORM;
        assert_eq!(
            blender.color_at(-0.5, &w, &aux()),
            blender.color_at(-6.0, &w, &aux())
        );
    }

    #[test]
    fn test_ice_above_ice_line() {
        let blender = BiomeColorBlender::default();
        let c = blender.color_at(ICE_LINE + 1.0, &BiomeWeights::UNIFORM, &aux());
        assert_eq!(c, blender.palette().ice);
    }

    #[test]
    fn test_rock_to_snow_is_linear() {
        let blender = BiomeColorBlender::default();
        let p = blender.palette();
        let mid = (PLATEAU_TOP + ICE_LINE) / 2.0;
        let c = blender.color_at(mid, &BiomeWeights::UNIFORM, &aux());
        let expected = p.rock.lerp(p.snow, 0.5);
        assert!((c.r - expected.r).abs() < 1e-5);
        assert!((c.g - expected.g).abs() < 1e-5);
        assert!((c.b - expected.b).abs() < 1e-5);
    }

    #[test]
    fn test_beach_tint_peaks_mid_band() {
        let mid = 0.5 * (BEACH_TINT_LOW + BEACH_TINT_HIGH);
        assert_eq!(beach_tint_weight(mid), 1.0);
        assert_eq!(beach_tint_weight(BEACH_TINT_HIGH + 0.1), 0.0);
        assert!(beach_tint_weight(mid + 0.2) < 1.0);
    }

    #[test]
    fn test_coast_strengthens_beach_tint() {
        let blender = BiomeColorBlender::default();
        let inland = blender.color_at(0.4, &BiomeWeights::UNIFORM, &aux());
        let coastal = blender.color_at(
            0.4,
            &BiomeWeights::UNIFORM,
            &AuxFields {
                coast: 1.0,
                ..aux()
            },
        );
        let warm = blender.palette().warm_sand;
        let dist = |c: Rgb| (c.r - warm.r).abs() + (c.g - warm.g).abs() + (c.b - warm.b).abs();
        assert!(dist(coastal) < dist(inland));
    }

    #[test]
    fn test_biome_tint_changes_plains_color() {
        let blender = BiomeColorBlender::default();
        let desert = BiomeWeights {
            desert: 1.0,
            forest: 0.0,
            plateau: 0.0,
            mountain: 0.0,
        };
        let forest = BiomeWeights {
            desert: 0.0,
            forest: 1.0,
            plateau: 0.0,
            mountain: 0.0,
        };
        assert_ne!(
            blender.color_at(3.0, &desert, &aux()),
            blender.color_at(3.0, &forest, &aux())
        );
    }

    #[test]
    fn test_every_input_maps_to_valid_color() {
        let blender = BiomeColorBlender::default();
        let weights = [
            BiomeWeights::UNIFORM,
            BiomeWeights {
                desert: f64::NAN,
                forest: -1.0,
                plateau: 0.0,
                mountain: 0.0,
            },
        ];
        let mut h = -10.0;
        while h <= 30.0 {
            for w in &weights {
                assert!(is_valid(blender.color_at(h, w, &aux())), "Invalid color at {h}");
            }
            h += 0.05;
        }
        for h in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(is_valid(blender.color_at(h, &BiomeWeights::UNIFORM, &aux())));
        }
    }

    #[test]
    fn test_from_hex_and_rgba8() {
        let c = Rgb::from_hex(0xff8000);
        assert_eq!(c.to_rgba8(), [255, 128, 0, 255]);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Rgb::new(1.0, 0.0, 0.0);
        let b = Rgb::new(0.0, 0.0, 1.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }
}

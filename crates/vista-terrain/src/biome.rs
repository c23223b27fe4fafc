//! Biome influence weights and the climate terms that drive them.
//!
//! Land cover is described by four competing, non-negative weights (desert,
//! forest, plateau, mountain) normalized to sum to 1. Ocean is not a biome
//! weight; it is a separate mask applied on top.

use crate::seed::det_pow;
use crate::world::BiasConfig;

/// Raw weight sums below this fall back to uniform weights.
const WEIGHT_EPSILON: f64 = 1e-9;

/// A land-cover category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BiomeKind {
    Desert,
    Forest,
    Plateau,
    Mountain,
}

impl BiomeKind {
    /// All kinds, in tie-break order: on equal weight the earlier kind wins.
    pub const ALL: [BiomeKind; 4] = [
        BiomeKind::Desert,
        BiomeKind::Forest,
        BiomeKind::Plateau,
        BiomeKind::Mountain,
    ];

    pub fn index(self) -> usize {
        match self {
            BiomeKind::Desert => 0,
            BiomeKind::Forest => 1,
            BiomeKind::Plateau => 2,
            BiomeKind::Mountain => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BiomeKind::Desert => "desert",
            BiomeKind::Forest => "forest",
            BiomeKind::Plateau => "plateau",
            BiomeKind::Mountain => "mountain",
        }
    }
}

/// Shaping terms derived from the heat and moisture fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClimateTerms {
    pub hot: f64,
    pub cold: f64,
    pub wet: f64,
    pub dry: f64,
    /// Peaks at mid-range heat, zero at both extremes.
    pub temperate: f64,
}

impl ClimateTerms {
    /// Build the terms from heat and moisture in `[0, 1]`.
    pub fn from_fields(heat: f64, moisture: f64) -> Self {
        let heat = heat.clamp(0.0, 1.0);
        let moisture = moisture.clamp(0.0, 1.0);
        Self {
            hot: det_pow(heat, 2.0),
            cold: det_pow(1.0 - heat, 2.0),
            wet: det_pow(moisture, 1.5),
            dry: det_pow(1.0 - moisture, 1.5),
            temperate: det_pow((1.0 - (heat - 0.5).abs() * 2.0).clamp(0.0, 1.0), 0.75),
        }
    }
}

/// Normalized biome influence weights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeWeights {
    pub desert: f64,
    pub forest: f64,
    pub plateau: f64,
    pub mountain: f64,
}

impl BiomeWeights {
    pub const UNIFORM: Self = Self {
        desert: 0.25,
        forest: 0.25,
        plateau: 0.25,
        mountain: 0.25,
    };

    /// Compute weights from climate, the mountain signal and plateau presence.
    ///
    /// Each raw weight is a product of shaping terms and its bias multiplier;
    /// the result is normalized.
    pub fn from_climate(
        climate: &ClimateTerms,
        mountain_signal: f64,
        plateau_presence: f64,
        biases: &BiasConfig,
    ) -> Self {
        let mountain_signal = mountain_signal.clamp(0.0, 1.0);
        let plateau_presence = plateau_presence.clamp(0.0, 1.0);
        Self {
            desert: climate.hot * climate.dry * 4.0 * biases.desert,
            forest: climate.wet * (0.35 + 0.65 * climate.temperate) * biases.forest,
            plateau: plateau_presence * (0.4 + 0.6 * climate.dry) * biases.plateau,
            mountain: (mountain_signal * 1.5 + climate.cold * 0.2) * biases.mountain,
        }
        .normalized()
    }

    /// Scale the weights to sum to 1.
    ///
    /// Negative or non-finite weights count as zero. If nothing is left the
    /// result is [`BiomeWeights::UNIFORM`].
    pub fn normalized(self) -> Self {
        let clean = |w: f64| if w.is_finite() { w.max(0.0) } else { 0.0 };
        let raw = [
            clean(self.desert),
            clean(self.forest),
            clean(self.plateau),
            clean(self.mountain),
        ];
        let sum: f64 = raw.iter().sum();
        if sum <= WEIGHT_EPSILON || !sum.is_finite() {
            return Self::UNIFORM;
        }
        Self {
            desert: raw[0] / sum,
            forest: raw[1] / sum,
            plateau: raw[2] / sum,
            mountain: raw[3] / sum,
        }
    }

    pub fn get(&self, kind: BiomeKind) -> f64 {
        match kind {
            BiomeKind::Desert => self.desert,
            BiomeKind::Forest => self.forest,
            BiomeKind::Plateau => self.plateau,
            BiomeKind::Mountain => self.mountain,
        }
    }

    pub fn sum(&self) -> f64 {
        self.desert + self.forest + self.plateau + self.mountain
    }

    /// The dominant biome, its weight, and the runner-up weight.
    ///
    /// Ties resolve in [`BiomeKind::ALL`] order.
    pub fn dominant(&self) -> (BiomeKind, f64, f64) {
        let mut best = BiomeKind::Desert;
        let mut best_w = self.desert;
        let mut second_w = f64::NEG_INFINITY;
        for kind in BiomeKind::ALL.into_iter().skip(1) {
            let w = self.get(kind);
            if w > best_w {
                second_w = best_w;
                best = kind;
                best_w = w;
            } else if w > second_w {
                second_w = w;
            }
        }
        (best, best_w, second_w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_normalized_sums_to_one() {
        let w = BiomeWeights {
            desert: 2.0,
            forest: 1.0,
            plateau: 0.5,
            mountain: 0.5,
        }
        .normalized();
        assert!((w.sum() - 1.0).abs() < EPSILON);
        assert!((w.desert - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_zero_weights_fall_back_to_uniform() {
        let w = BiomeWeights {
            desert: 0.0,
            forest: 0.0,
            plateau: 0.0,
            mountain: 0.0,
        }
        .normalized();
        assert_eq!(w, BiomeWeights::UNIFORM);
    }

    #[test]
    fn test_negative_and_nan_weights_ignored() {
        let w = BiomeWeights {
            desert: -3.0,
            forest: f64::NAN,
            plateau: 1.0,
            mountain: 1.0,
        }
        .normalized();
        assert_eq!(w.desert, 0.0);
        assert_eq!(w.forest, 0.0);
        assert!((w.plateau - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_dominant_and_runner_up() {
        let w = BiomeWeights {
            desert: 0.1,
            forest: 0.5,
            plateau: 0.3,
            mountain: 0.1,
        };
        let (kind, top, second) = w.dominant();
        assert_eq!(kind, BiomeKind::Forest);
        assert_eq!(top, 0.5);
        assert_eq!(second, 0.3);
    }

    #[test]
    fn test_dominant_tie_prefers_earlier_kind() {
        let w = BiomeWeights {
            desert: 0.1,
            forest: 0.1,
            plateau: 0.4,
            mountain: 0.4,
        };
        let (kind, top, second) = w.dominant();
        assert_eq!(kind, BiomeKind::Plateau);
        assert_eq!(top, second);
    }

    #[test]
    fn test_hot_dry_climate_favors_desert() {
        let climate = ClimateTerms::from_fields(0.9, 0.1);
        let w = BiomeWeights::from_climate(&climate, 0.0, 0.0, &BiasConfig::default());
        assert_eq!(w.dominant().0, BiomeKind::Desert);
    }

    #[test]
    fn test_temperate_wet_climate_favors_forest() {
        let climate = ClimateTerms::from_fields(0.5, 0.9);
        let w = BiomeWeights::from_climate(&climate, 0.0, 0.0, &BiasConfig::default());
        assert_eq!(w.dominant().0, BiomeKind::Forest);
    }

    #[test]
    fn test_strong_ridge_favors_mountain() {
        let climate = ClimateTerms::from_fields(0.5, 0.5);
        let w = BiomeWeights::from_climate(&climate, 1.0, 0.0, &BiasConfig::default());
        assert_eq!(w.dominant().0, BiomeKind::Mountain);
    }

    #[test]
    fn test_zero_bias_removes_biome() {
        let climate = ClimateTerms::from_fields(0.9, 0.1);
        let biases = BiasConfig {
            desert: 0.0,
            ..Default::default()
        };
        let w = BiomeWeights::from_climate(&climate, 0.2, 0.5, &biases);
        assert_eq!(w.desert, 0.0);
        assert!((w.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_climate_terms_in_unit_range() {
        for h in 0..=10 {
            for m in 0..=10 {
                let c = ClimateTerms::from_fields(h as f64 / 10.0, m as f64 / 10.0);
                for v in [c.hot, c.cold, c.wet, c.dry, c.temperate] {
                    assert!((0.0..=1.0).contains(&v));
                }
            }
        }
    }

    #[test]
    fn test_kind_names_and_indices() {
        for (i, kind) in BiomeKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert!(!kind.name().is_empty());
        }
    }
}

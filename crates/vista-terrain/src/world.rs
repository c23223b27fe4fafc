//! World configuration: seed, bias multipliers and derived noise offsets.
//!
//! A [`TerrainSnapshot`] is an immutable value shared behind an `Arc`. The only
//! way to change the world is [`TerrainConfigState::rebuild`], which produces a
//! new snapshot; holders of the previous one keep a consistent view.

use std::sync::Arc;

use crate::seed::NoiseOffsets;

/// Default ocean threshold: fraction of the ocean field treated as water.
pub const DEFAULT_OCEAN_THRESHOLD: f64 = 0.35;

/// Upper bound for bias multipliers; keeps weight products finite.
pub const MAX_BIAS: f64 = 1_000.0;

/// Biome bias multipliers and ocean threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiasConfig {
    pub desert: f64,
    pub forest: f64,
    pub plateau: f64,
    pub mountain: f64,
    /// Ocean mask threshold in `[0, 1]`; higher values mean more ocean.
    pub ocean_threshold: f64,
}

impl Default for BiasConfig {
    fn default() -> Self {
        Self {
            desert: 1.0,
            forest: 1.0,
            plateau: 1.0,
            mountain: 1.0,
            ocean_threshold: DEFAULT_OCEAN_THRESHOLD,
        }
    }
}

fn sanitize_multiplier(v: f64) -> f64 {
    if v.is_nan() {
        1.0
    } else {
        v.clamp(0.0, MAX_BIAS)
    }
}

impl BiasConfig {
    /// Clamp every value into its valid range.
    ///
    /// Negative multipliers become 0, NaN multipliers fall back to 1 and huge
    /// ones are capped at [`MAX_BIAS`]. The ocean threshold is clamped to
    /// `[0, 1]` (NaN falls back to the default).
    pub fn sanitized(self) -> Self {
        let ocean_threshold = if self.ocean_threshold.is_nan() {
            DEFAULT_OCEAN_THRESHOLD
        } else {
            self.ocean_threshold.clamp(0.0, 1.0)
        };
        Self {
            desert: sanitize_multiplier(self.desert),
            forest: sanitize_multiplier(self.forest),
            plateau: sanitize_multiplier(self.plateau),
            mountain: sanitize_multiplier(self.mountain),
            ocean_threshold,
        }
    }

    /// Merge optional overrides on top of `self`.
    pub fn merged(self, overrides: &BiasOverrides) -> Self {
        Self {
            desert: overrides.desert.unwrap_or(self.desert),
            forest: overrides.forest.unwrap_or(self.forest),
            plateau: overrides.plateau.unwrap_or(self.plateau),
            mountain: overrides.mountain.unwrap_or(self.mountain),
            ocean_threshold: overrides.ocean_threshold.unwrap_or(self.ocean_threshold),
        }
    }
}

/// Partial bias update used by [`TerrainConfigState::rebuild`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BiasOverrides {
    pub desert: Option<f64>,
    pub forest: Option<f64>,
    pub plateau: Option<f64>,
    pub mountain: Option<f64>,
    pub ocean_threshold: Option<f64>,
}

impl BiasOverrides {
    /// Overrides that replace every field.
    pub fn all(biases: BiasConfig) -> Self {
        Self {
            desert: Some(biases.desert),
            forest: Some(biases.forest),
            plateau: Some(biases.plateau),
            mountain: Some(biases.mountain),
            ocean_threshold: Some(biases.ocean_threshold),
        }
    }

    /// Returns `true` if no field is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Immutable world configuration used by every evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainSnapshot {
    seed: String,
    biases: BiasConfig,
    offsets: NoiseOffsets,
    generation: u64,
}

impl TerrainSnapshot {
    /// Build a snapshot with generation 0. Biases are sanitized.
    pub fn new(seed: impl Into<String>, biases: BiasConfig) -> Self {
        Self::with_generation(seed.into(), biases, 0)
    }

    fn with_generation(seed: String, biases: BiasConfig, generation: u64) -> Self {
        let offsets = NoiseOffsets::derive(&seed);
        Self {
            seed,
            biases: biases.sanitized(),
            offsets,
            generation,
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn biases(&self) -> &BiasConfig {
        &self.biases
    }

    pub fn offsets(&self) -> &NoiseOffsets {
        &self.offsets
    }

    /// Rebuild counter. Identifies which configuration a segment was built from;
    /// it never influences evaluated heights or colors.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Owner of the current [`TerrainSnapshot`].
pub struct TerrainConfigState {
    current: Arc<TerrainSnapshot>,
}

impl TerrainConfigState {
    pub fn new(seed: impl Into<String>, biases: BiasConfig) -> Self {
        Self {
            current: Arc::new(TerrainSnapshot::new(seed, biases)),
        }
    }

    /// A cheap handle to the current snapshot.
    pub fn snapshot(&self) -> Arc<TerrainSnapshot> {
        Arc::clone(&self.current)
    }

    pub fn generation(&self) -> u64 {
        self.current.generation
    }

    /// Replace the configuration.
    ///
    /// Overrides merge into the persisted seed and biases, offsets are derived
    /// again from the resulting seed, and the generation advances. Returns the
    /// new snapshot.
    pub fn rebuild(
        &mut self,
        new_seed: Option<String>,
        overrides: &BiasOverrides,
    ) -> Arc<TerrainSnapshot> {
        let seed = new_seed.unwrap_or_else(|| self.current.seed.clone());
        let biases = self.current.biases.merged(overrides);
        let generation = self.current.generation + 1;
        self.current = Arc::new(TerrainSnapshot::with_generation(seed, biases, generation));
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_multipliers_clamped() {
        let biases = BiasConfig {
            desert: -2.0,
            forest: 3.0,
            plateau: f64::NAN,
            mountain: -0.0001,
            ocean_threshold: 1.7,
        }
        .sanitized();
        assert_eq!(biases.desert, 0.0);
        assert_eq!(biases.forest, 3.0);
        assert_eq!(biases.plateau, 1.0);
        assert_eq!(biases.mountain, 0.0);
        assert_eq!(biases.ocean_threshold, 1.0);
    }

    #[test]
    fn test_threshold_below_zero_clamped() {
        let biases = BiasConfig {
            ocean_threshold: -0.3,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(biases.ocean_threshold, 0.0);
    }

    #[test]
    fn test_snapshot_sanitizes_on_ingestion() {
        let snapshot = TerrainSnapshot::new(
            "s",
            BiasConfig {
                desert: -1.0,
                ..Default::default()
            },
        );
        assert_eq!(snapshot.biases().desert, 0.0);
    }

    #[test]
    fn test_rebuild_merges_partial_overrides() {
        let mut state = TerrainConfigState::new("first", BiasConfig::default());
        let overrides = BiasOverrides {
            desert: Some(2.5),
            ..Default::default()
        };
        let snapshot = state.rebuild(None, &overrides);

        assert_eq!(snapshot.seed(), "first");
        assert_eq!(snapshot.biases().desert, 2.5);
        assert_eq!(snapshot.biases().forest, 1.0);
        assert_eq!(snapshot.generation(), 1);
    }

    #[test]
    fn test_rebuild_rederives_offsets_for_new_seed() {
        let mut state = TerrainConfigState::new("first", BiasConfig::default());
        let before = state.snapshot();
        let after = state.rebuild(Some("second".into()), &BiasOverrides::default());

        assert_ne!(before.offsets(), after.offsets());
        assert_eq!(after.offsets(), &NoiseOffsets::derive("second"));
    }

    #[test]
    fn test_old_snapshot_survives_rebuild() {
        let mut state = TerrainConfigState::new("keep", BiasConfig::default());
        let held = state.snapshot();
        state.rebuild(Some("other".into()), &BiasOverrides::default());

        assert_eq!(held.seed(), "keep");
        assert_eq!(held.generation(), 0);
        assert_eq!(state.generation(), 1);
    }

    #[test]
    fn test_rebuild_twice_same_inputs_same_offsets() {
        let mut state = TerrainConfigState::new("a", BiasConfig::default());
        let biases = BiasOverrides::all(BiasConfig {
            mountain: 2.0,
            ..Default::default()
        });
        let first = state.rebuild(Some("b".into()), &biases);
        let second = state.rebuild(Some("b".into()), &biases);

        assert_eq!(first.offsets(), second.offsets());
        assert_eq!(first.biases(), second.biases());
        assert_eq!(second.generation(), first.generation() + 1);
    }

    #[test]
    fn test_empty_overrides() {
        assert!(BiasOverrides::default().is_empty());
        assert!(!BiasOverrides::all(BiasConfig::default()).is_empty());
    }
}

//! Translating configuration into terrain and streaming types.

use tracing::info;
use vista_config::{Config, StreamConfig, WorldConfig};
use vista_stream::{TerrainWindowManager, WindowMargins};
use vista_terrain::{
    BiasConfig, BiasOverrides, SegmentBuilder, SegmentLayout, TerrainConfigState, generate_seed,
};

use crate::AppError;

/// Bias multipliers and ocean threshold from the world section.
pub fn biases(world: &WorldConfig) -> BiasConfig {
    BiasConfig {
        desert: world.desert_bias,
        forest: world.forest_bias,
        plateau: world.plateau_bias,
        mountain: world.mountain_bias,
        ocean_threshold: world.ocean_threshold,
    }
}

/// Overrides that replace every bias with the world section's values.
pub fn bias_overrides(world: &WorldConfig) -> BiasOverrides {
    BiasOverrides::all(biases(world))
}

pub fn layout(stream: &StreamConfig) -> SegmentLayout {
    SegmentLayout::new(
        stream.segment_length,
        stream.segment_width,
        stream.columns,
        stream.rows,
    )
}

pub fn margins(stream: &StreamConfig) -> WindowMargins {
    WindowMargins {
        behind: stream.behind,
        ahead: stream.ahead,
        prefetch: stream.prefetch,
    }
}

/// Make sure `config` carries a seed.
///
/// Returns `Some(seed)` if one had to be generated, so the caller can persist
/// it.
pub fn ensure_seed(config: &mut Config) -> Option<String> {
    if config.world.seed.as_deref().is_some_and(|s| !s.is_empty()) {
        return None;
    }
    let seed = generate_seed();
    config.world.seed = Some(seed.clone());
    Some(seed)
}

/// Build the window manager for `config`, with background prefetch if
/// enabled. The config must already carry a seed (see [`ensure_seed`]).
pub fn build_manager(config: &Config) -> Result<TerrainWindowManager, AppError> {
    let seed = config.world.seed.clone().unwrap_or_default();
    let state = TerrainConfigState::new(seed, biases(&config.world));
    let builder = SegmentBuilder::with_layout(layout(&config.stream));
    let mut manager = TerrainWindowManager::new(state, builder, margins(&config.stream));

    if config.stream.prefetch > 0 {
        manager
            .spawn_prefetch(config.stream.worker_threads)
            .map_err(AppError::Workers)?;
    }

    let snapshot = manager.snapshot();
    let layout = manager.layout();
    info!(
        "World seed '{}' | segments {}x{} ({}x{} quads) | window -{}/+{} (+{} prefetch)",
        snapshot.seed(),
        layout.width,
        layout.length,
        layout.columns,
        layout.rows,
        manager.margins().behind,
        manager.margins().ahead,
        manager.margins().prefetch,
    );
    Ok(manager)
}

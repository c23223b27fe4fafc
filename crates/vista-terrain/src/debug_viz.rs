//! Terrain debug visualization: top-down preview images of generated terrain.
//!
//! Provides [`DebugImage`] and renderers for final surface color, elevation
//! and dominant biome. The `vista` binary writes these out as PNG to inspect
//! a world without a renderer.

mod image;
mod renderers;

pub use self::image::DebugImage;
pub use renderers::{
    PreviewRegion, biome_color, height_to_color, render_biome_map, render_color_map,
    render_heightmap,
};

use crate::segment::SegmentBuilder;
use crate::world::TerrainSnapshot;

/// Which preview to render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PreviewKind {
    /// Final surface colors.
    #[default]
    Color,
    /// Elevation ramp.
    Height,
    /// Dominant biome.
    Biome,
}

impl PreviewKind {
    /// Parse a preview name (`color`, `height` or `biome`), case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "color" | "colour" => Some(Self::Color),
            "height" | "heightmap" => Some(Self::Height),
            "biome" | "biomes" => Some(Self::Biome),
            _ => None,
        }
    }

    pub fn render(
        self,
        builder: &SegmentBuilder,
        snapshot: &TerrainSnapshot,
        width: u32,
        height: u32,
        region: &PreviewRegion,
    ) -> DebugImage {
        match self {
            Self::Color => render_color_map(builder, snapshot, width, height, region),
            Self::Height => {
                render_heightmap(builder.synthesizer(), snapshot, width, height, region)
            }
            Self::Biome => {
                render_biome_map(builder.synthesizer(), snapshot, width, height, region)
            }
        }
    }
}

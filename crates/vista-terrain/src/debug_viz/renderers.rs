//! Top-down preview renderers: surface color, elevation and dominant biome.

use super::image::DebugImage;
use crate::biome::BiomeKind;
use crate::color::Rgb;
use crate::segment::{SegmentBuilder, SegmentLayout};
use crate::terrain_height::{HeightFieldSynthesizer, MAX_HEIGHT, MIN_HEIGHT, SEA_LEVEL};
use crate::world::TerrainSnapshot;

/// Ocean weight above which the biome map shows water.
const BIOME_MAP_OCEAN: f64 = 0.5;

/// A world-space rectangle on the XZ plane.
///
/// Image row 0 maps to `far_z`, the last row to `near_z`, so travel along −Z
/// points up in the image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewRegion {
    pub min_x: f64,
    pub max_x: f64,
    pub near_z: f64,
    pub far_z: f64,
}

impl PreviewRegion {
    /// The area covered by segments `lo..=hi`.
    pub fn covering(layout: &SegmentLayout, lo: i64, hi: i64) -> Self {
        let (lo, hi) = (lo.min(hi), lo.max(hi));
        Self {
            min_x: -0.5 * layout.width,
            max_x: 0.5 * layout.width,
            near_z: layout.origin_z(lo),
            far_z: layout.origin_z(hi.saturating_add(1)),
        }
    }

    /// World `(x, z)` at the center of pixel `(px, py)`.
    pub fn world_at(&self, px: u32, py: u32, width: u32, height: u32) -> (f64, f64) {
        let u = (px as f64 + 0.5) / width.max(1) as f64;
        let v = (py as f64 + 0.5) / height.max(1) as f64;
        let x = self.min_x + u * (self.max_x - self.min_x);
        let z = self.far_z + v * (self.near_z - self.far_z);
        (x, z)
    }
}

fn render_with(
    width: u32,
    height: u32,
    region: &PreviewRegion,
    mut shade: impl FnMut(f64, f64) -> Rgb,
) -> DebugImage {
    let mut image = DebugImage::new(width, height);
    for py in 0..height {
        for px in 0..width {
            let (x, z) = region.world_at(px, py, width, height);
            image.set_color(px, py, shade(x, z));
        }
    }
    image
}

/// Render the final surface colors over `region`.
pub fn render_color_map(
    builder: &SegmentBuilder,
    snapshot: &TerrainSnapshot,
    width: u32,
    height: u32,
    region: &PreviewRegion,
) -> DebugImage {
    render_with(width, height, region, |x, z| builder.sample(x, z, snapshot).1)
}

/// Render elevation over `region` using [`height_to_color`].
pub fn render_heightmap(
    synth: &HeightFieldSynthesizer,
    snapshot: &TerrainSnapshot,
    width: u32,
    height: u32,
    region: &PreviewRegion,
) -> DebugImage {
    render_with(width, height, region, |x, z| {
        height_to_color(synth.evaluate(x, z, snapshot).height)
    })
}

/// Render the dominant biome over `region`; open water is drawn blue.
pub fn render_biome_map(
    synth: &HeightFieldSynthesizer,
    snapshot: &TerrainSnapshot,
    width: u32,
    height: u32,
    region: &PreviewRegion,
) -> DebugImage {
    render_with(width, height, region, |x, z| {
        let sample = synth.evaluate(x, z, snapshot);
        if sample.aux.ocean > BIOME_MAP_OCEAN {
            Rgb::from_hex(0x1432b4)
        } else {
            biome_color(sample.weights.dominant().0)
        }
    })
}

/// Map a height to a debug color: blue shades below sea level, a dark-to-light
/// gray ramp above it.
pub fn height_to_color(height: f64) -> Rgb {
    if !height.is_finite() {
        return Rgb::BLACK;
    }
    if height < SEA_LEVEL {
        let t = ((height - MIN_HEIGHT) / (SEA_LEVEL - MIN_HEIGHT)).clamp(0.0, 1.0) as f32;
        Rgb::from_hex(0x000050).lerp(Rgb::from_hex(0x1e50c8), t)
    } else {
        let t = ((height - SEA_LEVEL) / (MAX_HEIGHT - SEA_LEVEL)).clamp(0.0, 1.0) as f32;
        let v = 0.15 + 0.85 * t;
        Rgb::new(v, v, v)
    }
}

/// Flat debug color per biome.
pub fn biome_color(kind: BiomeKind) -> Rgb {
    match kind {
        BiomeKind::Desert => Rgb::from_hex(0xdcbe50),
        BiomeKind::Forest => Rgb::from_hex(0x1e781e),
        BiomeKind::Plateau => Rgb::from_hex(0xb4643c),
        BiomeKind::Mountain => Rgb::from_hex(0x826e5a),
    }
}

//! Top-down PNG previews of the resident window.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use vista_stream::TerrainWindowManager;
use vista_terrain::debug_viz::{DebugImage, PreviewKind, PreviewRegion};

/// Largest preview edge in pixels.
pub const MAX_PREVIEW_DIM: u32 = 4096;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("failed to write preview {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode preview: {0}")]
    Encode(#[from] png::EncodingError),
}

/// Pixel size for a world extent at `scale` pixels per unit, clamped to
/// `1..=MAX_PREVIEW_DIM`.
fn pixels_for(extent: f64, scale: f64) -> u32 {
    let px = (extent * scale).round();
    if px.is_finite() {
        px.clamp(1.0, MAX_PREVIEW_DIM as f64) as u32
    } else {
        1
    }
}

/// Render the manager's current window (or segment 0 before the first
/// update) from above.
pub fn render_window_preview(
    manager: &TerrainWindowManager,
    kind: PreviewKind,
    scale: f64,
) -> DebugImage {
    let layout = manager.layout();
    let (lo, hi) = manager.window().map_or((0, 0), |w| (w.lo, w.hi));
    let region = PreviewRegion::covering(layout, lo, hi);

    let width = pixels_for(region.max_x - region.min_x, scale);
    let height = pixels_for(region.near_z - region.far_z, scale);
    kind.render(
        manager.builder(),
        &manager.snapshot(),
        width,
        height,
        &region,
    )
}

/// Encode `image` as an 8-bit RGBA PNG.
pub fn write_png(image: &DebugImage, path: &Path) -> Result<(), PreviewError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| PreviewError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let file = File::create(path).map_err(|source| PreviewError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (width, height) = image.dimensions();
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.pixels)?;
    writer.finish()?;

    info!(
        "Wrote {}x{} preview to {}",
        width,
        height,
        path.display()
    );
    Ok(())
}

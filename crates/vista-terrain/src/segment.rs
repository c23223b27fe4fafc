//! Terrain segments: the unit of streaming along the travel axis.
//!
//! Segment `i` covers the world band `z ∈ [-(i+1)·L, -i·L)` and spans
//! `[-W/2, W/2]` across it. Its vertex grid is generated once from an index
//! and a [`TerrainSnapshot`] and never changes afterwards.

use glam::{DVec3, Vec3};

use crate::color::{BiomeColorBlender, Rgb};
use crate::terrain_height::{HeightFieldSynthesizer, SurfaceSample};
use crate::world::TerrainSnapshot;

/// Default segment length along the travel axis.
pub const DEFAULT_SEGMENT_LENGTH: f64 = 50.0;
/// Default segment width across the travel axis.
pub const DEFAULT_SEGMENT_WIDTH: f64 = 100.0;

/// Size and resolution of every segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentLayout {
    /// Extent along the travel axis (`L`).
    pub length: f64,
    /// Extent across the travel axis.
    pub width: f64,
    /// Quads across the width.
    pub columns: u32,
    /// Quads along the length.
    pub rows: u32,
}

impl Default for SegmentLayout {
    fn default() -> Self {
        Self {
            length: DEFAULT_SEGMENT_LENGTH,
            width: DEFAULT_SEGMENT_WIDTH,
            columns: 64,
            rows: 32,
        }
    }
}

impl SegmentLayout {
    /// Build a layout, replacing non-positive or non-finite sizes with the
    /// defaults and zero resolutions with 1.
    pub fn new(length: f64, width: f64, columns: u32, rows: u32) -> Self {
        let positive = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
        Self {
            length: positive(length, DEFAULT_SEGMENT_LENGTH),
            width: positive(width, DEFAULT_SEGMENT_WIDTH),
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }

    /// Vertices per row (across the width).
    pub fn vertices_per_row(&self) -> usize {
        self.columns as usize + 1
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices_per_row() * (self.rows as usize + 1)
    }

    /// World z of the near edge of segment `index` (`-index · L`).
    pub fn origin_z(&self, index: i64) -> f64 {
        -(index as f64) * self.length
    }

    /// Local offset of grid point `(column, row)` from the segment origin.
    ///
    /// `x` runs from `-W/2` to `W/2`; `z` runs from 0 to `-L`.
    pub fn local_offset(&self, column: u32, row: u32) -> (f64, f64) {
        let x = -0.5 * self.width + self.width * column as f64 / self.columns as f64;
        let z = -self.length * row as f64 / self.rows as f64;
        (x, z)
    }
}

/// One grid vertex: position relative to the segment origin, plus color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentVertex {
    pub position: Vec3,
    pub color: Rgb,
}

/// An immutable vertex grid for one segment index.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    index: i64,
    generation: u64,
    origin_z: f64,
    layout: SegmentLayout,
    vertices: Vec<SegmentVertex>,
    min_height: f32,
    max_height: f32,
}

impl Segment {
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Generation of the snapshot this segment was built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// World-space z of the segment origin. Vertex positions are relative to
    /// `(0, 0, origin_z)`.
    pub fn origin_z(&self) -> f64 {
        self.origin_z
    }

    pub fn layout(&self) -> &SegmentLayout {
        &self.layout
    }

    /// Row-major vertices, rows ordered from the near edge to the far edge.
    pub fn vertices(&self) -> &[SegmentVertex] {
        &self.vertices
    }

    pub fn vertex(&self, column: u32, row: u32) -> Option<&SegmentVertex> {
        if column > self.layout.columns || row > self.layout.rows {
            return None;
        }
        self.vertices
            .get(row as usize * self.layout.vertices_per_row() + column as usize)
    }

    /// World-space position of a vertex.
    pub fn world_position(&self, vertex: &SegmentVertex) -> DVec3 {
        vertex.position.as_dvec3() + DVec3::new(0.0, 0.0, self.origin_z)
    }

    /// `(min, max)` vertex height.
    pub fn height_range(&self) -> (f32, f32) {
        (self.min_height, self.max_height)
    }

    /// Approximate heap size of the vertex buffer in bytes.
    pub fn buffer_bytes(&self) -> usize {
        self.vertices.len() * std::mem::size_of::<SegmentVertex>()
    }
}

/// Builds segments from a shared synthesizer and color blender.
#[derive(Clone, Default)]
pub struct SegmentBuilder {
    synth: HeightFieldSynthesizer,
    blender: BiomeColorBlender,
    layout: SegmentLayout,
}

impl SegmentBuilder {
    pub fn new(
        synth: HeightFieldSynthesizer,
        blender: BiomeColorBlender,
        layout: SegmentLayout,
    ) -> Self {
        Self {
            synth,
            blender,
            layout,
        }
    }

    /// Builder with default shaping and palette.
    pub fn with_layout(layout: SegmentLayout) -> Self {
        Self::new(HeightFieldSynthesizer::default(), BiomeColorBlender::default(), layout)
    }

    pub fn layout(&self) -> &SegmentLayout {
        &self.layout
    }

    pub fn synthesizer(&self) -> &HeightFieldSynthesizer {
        &self.synth
    }

    pub fn blender(&self) -> &BiomeColorBlender {
        &self.blender
    }

    /// Evaluate height, weights and color at a world point.
    pub fn sample(&self, world_x: f64, world_z: f64, snapshot: &TerrainSnapshot) -> (SurfaceSample, Rgb) {
        let surface = self.synth.evaluate(world_x, world_z, snapshot);
        let color = self
            .blender
            .color_at(surface.height, &surface.weights, &surface.aux);
        (surface, color)
    }

    /// Generate the segment for `index`. Any index is valid, including
    /// negative ones behind the world origin.
    pub fn build(&self, index: i64, snapshot: &TerrainSnapshot) -> Segment {
        let layout = self.layout;
        let origin_z = layout.origin_z(index);
        let mut vertices = Vec::with_capacity(layout.vertex_count());
        let mut min_height = f32::INFINITY;
        let mut max_height = f32::NEG_INFINITY;

        for row in 0..=layout.rows {
            for column in 0..=layout.columns {
                let (x, dz) = layout.local_offset(column, row);
                let (surface, color) = self.sample(x, origin_z + dz, snapshot);
                let height = surface.height as f32;
                min_height = min_height.min(height);
                max_height = max_height.max(height);
                vertices.push(SegmentVertex {
                    position: Vec3::new(x as f32, height, dz as f32),
                    color,
                });
            }
        }

        Segment {
            index,
            generation: snapshot.generation(),
            origin_z,
            layout,
            vertices,
            min_height,
            max_height,
        }
    }
}

//! Procedural terrain synthesis: deterministic seeding, fractal noise, height
//! field composition, biome coloring and segment generation.

mod async_generation;
mod color;
mod heightmap;
mod noise_field;
mod segment;
mod terrain_height;
mod world;

pub mod biome;
pub mod debug_viz;
pub mod seed;

pub use async_generation::{AsyncSegmentGenerator, GeneratedSegment, GenerationTask};
pub use biome::{BiomeKind, BiomeWeights, ClimateTerms};
pub use color::{
    BEACH_TOP, BiomeColorBlender, FOREST_TOP, ICE_LINE, PLAINS_TOP, PLATEAU_TOP, Palette, Rgb,
};
pub use heightmap::{FractalParams, FractalSampler, lerp, smoothstep};
pub use noise_field::NoiseField;
pub use seed::{NoiseOffsets, SeedRng, generate_seed};
pub use segment::{
    DEFAULT_SEGMENT_LENGTH, DEFAULT_SEGMENT_WIDTH, Segment, SegmentBuilder, SegmentLayout,
    SegmentVertex,
};
pub use terrain_height::{
    AuxFields, HeightFieldSynthesizer, MAX_HEIGHT, MIN_HEIGHT, SEA_LEVEL, ShapeParams,
    SurfaceSample,
};
pub use world::{
    BiasConfig, BiasOverrides, DEFAULT_OCEAN_THRESHOLD, MAX_BIAS, TerrainConfigState,
    TerrainSnapshot,
};

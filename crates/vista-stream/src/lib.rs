//! Segment streaming along the travel axis: window range math and the
//! [`TerrainWindowManager`] that keeps exactly the required segments resident.

mod manager;
mod window;

pub use manager::{TerrainWindowManager, WindowStats, WindowUpdate};
pub use window::{SegmentWindow, WindowMargins, center_index};

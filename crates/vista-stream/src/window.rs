//! Window range math.

use std::ops::RangeInclusive;

/// Integer margins around the center segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowMargins {
    /// Segments kept behind the viewpoint.
    pub behind: u32,
    /// Segments kept ahead of the viewpoint.
    pub ahead: u32,
    /// Segments generated in the background beyond `ahead`.
    pub prefetch: u32,
}

impl Default for WindowMargins {
    fn default() -> Self {
        Self {
            behind: 1,
            ahead: 6,
            prefetch: 2,
        }
    }
}

impl WindowMargins {
    /// Number of segments resident after an update (`behind + ahead + 1`).
    pub fn window_len(&self) -> u64 {
        self.behind as u64 + self.ahead as u64 + 1
    }
}

/// Index of the segment containing `viewpoint_z`: `floor(-z / L)`.
///
/// Saturates at the `i64` range; a NaN viewpoint maps to 0. A non-positive or
/// non-finite `segment_length` also yields 0.
pub fn center_index(viewpoint_z: f64, segment_length: f64) -> i64 {
    if !(segment_length.is_finite() && segment_length > 0.0) {
        return 0;
    }
    (-viewpoint_z / segment_length).floor() as i64
}

/// Inclusive range of segment indices `[lo, hi]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentWindow {
    pub lo: i64,
    pub hi: i64,
}

impl SegmentWindow {
    /// The required window `[center - behind, center + ahead]`.
    pub fn around(center: i64, margins: &WindowMargins) -> Self {
        Self {
            lo: center.saturating_sub(margins.behind as i64),
            hi: center.saturating_add(margins.ahead as i64),
        }
    }

    pub fn contains(&self, index: i64) -> bool {
        (self.lo..=self.hi).contains(&index)
    }

    /// Number of indices in the window.
    pub fn segment_count(&self) -> u64 {
        self.hi.abs_diff(self.lo) + 1
    }

    pub fn indices(&self) -> RangeInclusive<i64> {
        self.lo..=self.hi
    }

    /// Indices generated in the background just beyond the far edge.
    #[allow(clippy::reversed_empty_ranges)]
    pub fn prefetch_zone(&self, prefetch: u32) -> RangeInclusive<i64> {
        if prefetch == 0 || self.hi == i64::MAX {
            return 1..=0;
        }
        self.hi + 1..=self.hi.saturating_add(prefetch as i64)
    }
}

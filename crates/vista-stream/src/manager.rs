//! Sliding window of resident terrain segments.
//!
//! [`TerrainWindowManager::update_window`] is called once per tick with the
//! viewpoint's travel-axis coordinate. When it returns, the resident indices
//! are exactly the required window: missing segments are built, segments
//! outside are dropped. Segments just beyond the far edge can be generated in
//! the background and adopted when the window reaches them.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::Arc;

use tracing::{debug, info, warn};
use vista_terrain::{
    AsyncSegmentGenerator, BiasOverrides, GenerationTask, Segment, SegmentBuilder, SegmentLayout,
    TerrainConfigState, TerrainSnapshot,
};

use crate::window::{SegmentWindow, WindowMargins, center_index};

/// Cumulative streaming counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowStats {
    /// Segments built synchronously inside `update_window`.
    pub created: u64,
    /// Segments dropped for leaving the window.
    pub evicted: u64,
    /// Background-generated segments that became resident.
    pub adopted: u64,
    /// Background results dropped (stale generation or no longer needed).
    pub discarded: u64,
    /// Number of rebuilds.
    pub rebuilds: u64,
    /// Vertices across all resident segments.
    pub resident_vertices: usize,
    /// Vertex buffer bytes across all resident segments.
    pub resident_bytes: usize,
}

/// What one `update_window` call changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowUpdate {
    pub center: i64,
    pub window: Option<SegmentWindow>,
    /// Indices that became resident, built or adopted.
    pub created: Vec<i64>,
    pub evicted: Vec<i64>,
    /// How many of `created` came from background generation.
    pub adopted: usize,
}

impl WindowUpdate {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.evicted.is_empty()
    }
}

/// Owns the terrain configuration and the resident segments.
pub struct TerrainWindowManager {
    config: TerrainConfigState,
    builder: Arc<SegmentBuilder>,
    margins: WindowMargins,
    resident: BTreeMap<i64, Segment>,
    /// Background results waiting in the prefetch zone.
    staged: HashMap<i64, Segment>,
    generator: Option<AsyncSegmentGenerator>,
    window: Option<SegmentWindow>,
    last_viewpoint: Option<f64>,
    stats: WindowStats,
}

impl TerrainWindowManager {
    /// Create a manager with nothing resident and synchronous generation only.
    pub fn new(config: TerrainConfigState, builder: SegmentBuilder, margins: WindowMargins) -> Self {
        Self {
            config,
            builder: Arc::new(builder),
            margins,
            resident: BTreeMap::new(),
            staged: HashMap::new(),
            generator: None,
            window: None,
            last_viewpoint: None,
            stats: WindowStats::default(),
        }
    }

    /// Start `threads` background workers for the prefetch zone.
    ///
    /// `threads == 0` sizes the pool from the CPU count.
    pub fn spawn_prefetch(&mut self, threads: usize) -> io::Result<()> {
        let builder = Arc::clone(&self.builder);
        let queue = (self.margins.prefetch as usize * 2).max(8);
        let generator = if threads == 0 {
            AsyncSegmentGenerator::with_defaults(builder)?
        } else {
            AsyncSegmentGenerator::new(builder, threads, queue, queue)?
        };
        info!(
            "Segment prefetch enabled: {} segments beyond the window",
            self.margins.prefetch
        );
        self.generator = Some(generator);
        Ok(())
    }

    pub fn has_prefetch(&self) -> bool {
        self.generator.is_some()
    }

    /// Bring the resident set to exactly the window around `viewpoint_z`.
    pub fn update_window(&mut self, viewpoint_z: f64) -> WindowUpdate {
        self.last_viewpoint = Some(viewpoint_z);
        let center = center_index(viewpoint_z, self.builder.layout().length);
        let window = SegmentWindow::around(center, &self.margins);
        let snapshot = self.config.snapshot();

        self.collect_background(&window, snapshot.generation());

        let mut update = WindowUpdate {
            center,
            window: Some(window),
            ..Default::default()
        };

        for index in window.indices() {
            if self.resident.contains_key(&index) {
                continue;
            }
            let segment = match self.staged.remove(&index) {
                Some(segment) => {
                    update.adopted += 1;
                    self.stats.adopted += 1;
                    segment
                }
                None => {
                    if let Some(generator) = &self.generator {
                        generator.cancel(index);
                    }
                    self.stats.created += 1;
                    self.builder.build(index, &snapshot)
                }
            };
            debug!("Segment {} resident (generation {})", index, segment.generation());
            self.resident.insert(index, segment);
            update.created.push(index);
        }

        self.resident.retain(|&index, _| {
            let keep = window.contains(index);
            if !keep {
                update.evicted.push(index);
            }
            keep
        });
        for index in &update.evicted {
            debug!("Segment {} evicted", index);
        }
        self.stats.evicted += update.evicted.len() as u64;

        self.request_prefetch(&window, &snapshot);

        self.window = Some(window);
        self.refresh_totals();
        update
    }

    /// Move finished background segments into the staging area, dropping
    /// stale or unneeded ones.
    fn collect_background(&mut self, window: &SegmentWindow, generation: u64) {
        let Some(generator) = &self.generator else {
            return;
        };
        let zone = window.prefetch_zone(self.margins.prefetch);
        for generated in generator.drain_results() {
            let segment = generated.segment;
            let index = segment.index();
            let wanted = window.contains(index) || zone.contains(&index);
            if segment.generation() != generation || !wanted || self.resident.contains_key(&index)
            {
                self.stats.discarded += 1;
                continue;
            }
            self.staged.insert(index, segment);
        }
        self.staged
            .retain(|index, _| window.contains(*index) || zone.contains(index));
    }

    fn request_prefetch(&mut self, window: &SegmentWindow, snapshot: &Arc<TerrainSnapshot>) {
        let Some(generator) = &self.generator else {
            return;
        };
        for index in window.prefetch_zone(self.margins.prefetch) {
            if self.staged.contains_key(&index) || generator.is_pending(index) {
                continue;
            }
            let task = GenerationTask {
                index,
                snapshot: Arc::clone(snapshot),
            };
            if generator.submit(task).is_err() {
                warn!("Prefetch queue full; segment {} will be built on demand", index);
                break;
            }
        }
    }

    fn refresh_totals(&mut self) {
        self.stats.resident_vertices = self.resident.values().map(|s| s.vertices().len()).sum();
        self.stats.resident_bytes = self.resident.values().map(Segment::buffer_bytes).sum();
    }

    /// Replace the configuration and regenerate the window from scratch.
    ///
    /// Pending background work is cancelled and every resident segment is
    /// dropped. If the window was ever positioned, it is repopulated around
    /// the last viewpoint before returning.
    pub fn rebuild(
        &mut self,
        new_seed: Option<String>,
        overrides: &BiasOverrides,
    ) -> Arc<TerrainSnapshot> {
        if let Some(generator) = &self.generator {
            generator.cancel_all();
        }
        let dropped = self.resident.len();
        self.resident.clear();
        self.staged.clear();
        self.window = None;

        let snapshot = self.config.rebuild(new_seed, overrides);
        self.stats.rebuilds += 1;
        info!(
            "Terrain rebuilt: seed '{}', generation {}, {} segments dropped",
            snapshot.seed(),
            snapshot.generation(),
            dropped
        );

        if let Some(z) = self.last_viewpoint {
            self.update_window(z);
        } else {
            self.refresh_totals();
        }
        snapshot
    }

    /// Build the segment for any index from the current configuration,
    /// without making it resident.
    pub fn build_segment(&self, index: i64) -> Segment {
        self.builder.build(index, &self.config.snapshot())
    }

    pub fn segment(&self, index: i64) -> Option<&Segment> {
        self.resident.get(&index)
    }

    /// Resident segments in ascending index order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.resident.values()
    }

    pub fn resident_indices(&self) -> Vec<i64> {
        self.resident.keys().copied().collect()
    }

    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    /// Window after the last update, if any.
    pub fn window(&self) -> Option<SegmentWindow> {
        self.window
    }

    pub fn snapshot(&self) -> Arc<TerrainSnapshot> {
        self.config.snapshot()
    }

    pub fn builder(&self) -> &SegmentBuilder {
        &self.builder
    }

    pub fn layout(&self) -> &SegmentLayout {
        self.builder.layout()
    }

    pub fn margins(&self) -> &WindowMargins {
        &self.margins
    }

    pub fn stats(&self) -> WindowStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use vista_terrain::BiasConfig;

    const L: f64 = 50.0;

    fn margins() -> WindowMargins {
        WindowMargins {
            behind: 2,
            ahead: 4,
            prefetch: 2,
        }
    }

    fn manager(seed: &str) -> TerrainWindowManager {
        TerrainWindowManager::new(
            TerrainConfigState::new(seed, BiasConfig::default()),
            SegmentBuilder::with_layout(SegmentLayout::new(L, 100.0, 2, 1)),
            margins(),
        )
    }

    fn expected(z: f64) -> Vec<i64> {
        let center = (-z / L).floor() as i64;
        (center - 2..=center + 4).collect()
    }

    fn wait_idle(m: &TerrainWindowManager) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while let Some(g) = &m.generator {
            if g.in_flight_count() == 0 || Instant::now() > deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_window_invariant_at_sample_viewpoints() {
        let mut m = manager("window");
        for z in [0.0, -37.0, -1000.0, 500_000.0] {
            m.update_window(z);
            assert_eq!(m.resident_indices(), expected(z), "viewpoint {z}");
        }
    }

    #[test]
    fn test_window_invariant_fresh_manager_each_viewpoint() {
        for z in [0.0, -37.0, -1000.0, 500_000.0] {
            let mut m = manager("fresh");
            let update = m.update_window(z);
            assert_eq!(m.resident_indices(), expected(z));
            assert_eq!(update.created, expected(z));
            assert!(update.evicted.is_empty());
        }
    }

    #[test]
    fn test_bounded_residency_over_long_flight() {
        let mut m = manager("long-flight");
        let limit = m.margins().window_len() as usize;
        for step in 0..=10_000 {
            let z = -(step as f64) * L;
            m.update_window(z);
            assert!(m.resident_count() <= limit, "resident {} at step {step}", m.resident_count());
        }
        assert_eq!(m.resident_indices(), expected(-10_000.0 * L));
        let stats = m.stats();
        assert_eq!(stats.created - stats.evicted, limit as u64);
    }

    #[test]
    fn test_same_viewpoint_is_noop() {
        let mut m = manager("noop");
        m.update_window(-120.0);
        let update = m.update_window(-121.0);
        assert!(update.is_noop());
    }

    #[test]
    fn test_backwards_travel_keeps_invariant() {
        let mut m = manager("reverse");
        m.update_window(-500.0);
        let update = m.update_window(400.0);
        assert_eq!(m.resident_indices(), expected(400.0));
        assert!(update.created.iter().all(|&i| i < 0));
    }

    #[test]
    fn test_rebuild_repopulates_current_window() {
        let mut m = manager("before");
        m.update_window(-260.0);
        let snapshot = m.rebuild(Some("after".into()), &BiasOverrides::default());

        assert_eq!(snapshot.generation(), 1);
        assert_eq!(m.resident_indices(), expected(-260.0));
        assert!(m.segments().all(|s| s.generation() == 1));
        let fresh = manager("after").build_segment(5);
        assert_eq!(m.segment(5).unwrap().vertices(), fresh.vertices());
    }

    #[test]
    fn test_rebuild_before_first_update_stays_empty() {
        let mut m = manager("idle");
        m.rebuild(None, &BiasOverrides::default());
        assert_eq!(m.resident_count(), 0);
        assert!(m.window().is_none());
    }

    #[test]
    fn test_rebuild_twice_matches_single_rebuild() {
        let overrides = BiasOverrides::all(BiasConfig {
            desert: 2.0,
            mountain: 0.5,
            ..Default::default()
        });

        let mut once = manager("origin");
        once.update_window(-75.0);
        once.rebuild(Some("target".into()), &overrides);

        let mut twice = manager("origin");
        twice.update_window(-75.0);
        twice.rebuild(Some("target".into()), &overrides);
        twice.rebuild(Some("target".into()), &overrides);

        assert_eq!(once.resident_indices(), twice.resident_indices());
        for (a, b) in once.segments().zip(twice.segments()) {
            assert_eq!(a.vertices(), b.vertices());
        }
    }

    #[test]
    fn test_build_segment_any_index() {
        let m = manager("any");
        for index in [i64::MIN, -1, 0, 1, i64::MAX] {
            assert_eq!(m.build_segment(index).index(), index);
        }
    }

    #[test]
    fn test_non_finite_viewpoint_is_tolerated() {
        let mut m = manager("nan");
        m.update_window(f64::NAN);
        assert_eq!(m.resident_indices(), expected(0.0));
        m.update_window(f64::NEG_INFINITY);
        assert_eq!(m.resident_count(), 3);
    }

    #[test]
    fn test_prefetched_segments_are_adopted() {
        let mut m = manager("prefetch");
        m.spawn_prefetch(2).unwrap();
        m.update_window(0.0);
        wait_idle(&m);

        let update = m.update_window(-L);
        assert_eq!(m.resident_indices(), expected(-L));
        assert_eq!(update.adopted, 1);
        assert_eq!(m.stats().adopted, 1);

        let adopted = m.segment(5).unwrap();
        assert_eq!(adopted, &m.build_segment(5));
    }

    #[test]
    fn test_stale_background_results_discarded() {
        let mut m = manager("stale");
        m.spawn_prefetch(1).unwrap();
        m.update_window(0.0);
        m.rebuild(Some("fresh".into()), &BiasOverrides::default());
        wait_idle(&m);

        for step in 1..=4 {
            m.update_window(-(step as f64) * L);
            assert!(m.segments().all(|s| s.generation() == 1));
        }
        assert_eq!(m.resident_indices(), expected(-4.0 * L));
    }

    #[test]
    fn test_stats_track_resident_vertices() {
        let mut m = manager("stats");
        m.update_window(0.0);
        let stats = m.stats();
        assert_eq!(stats.resident_vertices, 7 * 6);
        assert!(stats.resident_bytes > 0);
        assert_eq!(stats.created, 7);
    }
}

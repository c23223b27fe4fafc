//! Background segment generation on a worker thread pool.
//!
//! Each task carries the [`TerrainSnapshot`] it must be built from, so a
//! segment is never generated from a mix of old and new configuration.
//! Tasks can be cancelled individually or all at once (on rebuild), and
//! completed segments are delivered through a bounded channel.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, bounded};
use dashmap::DashMap;

use crate::segment::{Segment, SegmentBuilder};
use crate::world::TerrainSnapshot;

/// A request to generate one segment.
#[derive(Clone, Debug)]
pub struct GenerationTask {
    pub index: i64,
    /// Configuration the segment is built from.
    pub snapshot: Arc<TerrainSnapshot>,
}

/// A generated segment ready to be adopted by the window.
#[derive(Debug)]
pub struct GeneratedSegment {
    pub segment: Segment,
    /// Generation time in microseconds (for profiling).
    pub generation_time_us: u64,
}

struct QueuedTask {
    task: GenerationTask,
    cancelled: Arc<AtomicBool>,
}

struct ActiveTask {
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

/// Generates segments on worker threads.
pub struct AsyncSegmentGenerator {
    task_sender: Sender<QueuedTask>,
    result_receiver: Receiver<GeneratedSegment>,
    /// Cancellation flag per pending index.
    active_tasks: Arc<DashMap<i64, ActiveTask>>,
    in_flight: Arc<AtomicU64>,
}

impl AsyncSegmentGenerator {
    /// Spawn `thread_count` workers sharing `builder`.
    ///
    /// At most `max_queued` tasks wait in the queue; further submissions are
    /// rejected. Completed segments buffer up to `result_capacity`.
    pub fn new(
        builder: Arc<SegmentBuilder>,
        thread_count: usize,
        max_queued: usize,
        result_capacity: usize,
    ) -> io::Result<Self> {
        let (task_sender, task_receiver) = bounded::<QueuedTask>(max_queued.max(1));
        let (result_sender, result_receiver) = bounded::<GeneratedSegment>(result_capacity.max(1));
        let in_flight = Arc::new(AtomicU64::new(0));

        for worker in 0..thread_count.max(1) {
            let receiver = task_receiver.clone();
            let sender = result_sender.clone();
            let in_flight = Arc::clone(&in_flight);
            let builder = Arc::clone(&builder);

            std::thread::Builder::new()
                .name(format!("segment-gen-{worker}"))
                .spawn(move || {
                    while let Ok(queued) = receiver.recv() {
                        if queued.cancelled.load(Ordering::Relaxed) {
                            in_flight.fetch_sub(1, Ordering::Relaxed);
                            continue;
                        }

                        let start = Instant::now();
                        let segment = builder.build(queued.task.index, &queued.task.snapshot);
                        let elapsed = start.elapsed().as_micros() as u64;

                        if !queued.cancelled.load(Ordering::Relaxed) {
                            let _ = sender.send(GeneratedSegment {
                                segment,
                                generation_time_us: elapsed,
                            });
                        }

                        in_flight.fetch_sub(1, Ordering::Relaxed);
                    }
                })?;
        }

        Ok(Self {
            task_sender,
            result_receiver,
            active_tasks: Arc::new(DashMap::new()),
            in_flight,
        })
    }

    /// Create a generator sized from the CPU count, leaving headroom for the
    /// main thread.
    pub fn with_defaults(builder: Arc<SegmentBuilder>) -> io::Result<Self> {
        let cpus = num_cpus::get().max(2);
        Self::new(builder, (cpus - 1).max(1), 64, 64)
    }

    /// Queue a segment for generation.
    ///
    /// A pending task for the same index is cancelled and replaced. Returns
    /// `Err(task)` if the queue is full.
    #[allow(clippy::result_large_err)]
    pub fn submit(&self, task: GenerationTask) -> Result<(), GenerationTask> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let active = ActiveTask {
            generation: task.snapshot.generation(),
            cancelled: Arc::clone(&cancelled),
        };
        if let Some(previous) = self.active_tasks.insert(task.index, active) {
            previous.cancelled.store(true, Ordering::Relaxed);
        }
        self.in_flight.fetch_add(1, Ordering::Relaxed);

        let index = task.index;
        self.task_sender
            .try_send(QueuedTask { task, cancelled })
            .map_err(|e| {
                self.in_flight.fetch_sub(1, Ordering::Relaxed);
                self.active_tasks.remove(&index);
                e.into_inner().task
            })
    }

    /// Cancel a pending or running task. No-op if it already completed.
    pub fn cancel(&self, index: i64) {
        if let Some((_, active)) = self.active_tasks.remove(&index) {
            active.cancelled.store(true, Ordering::Relaxed);
        }
    }

    /// Cancel every pending task and drop any undelivered results.
    pub fn cancel_all(&self) {
        self.active_tasks.retain(|_, active| {
            active.cancelled.store(true, Ordering::Relaxed);
            false
        });
        while self.result_receiver.try_recv().is_ok() {}
    }

    /// Drain all completed segments. Call once per tick on the main thread.
    pub fn drain_results(&self) -> Vec<GeneratedSegment> {
        let mut results = Vec::new();
        while let Ok(generated) = self.result_receiver.try_recv() {
            let segment = &generated.segment;
            self.active_tasks
                .remove_if(&segment.index(), |_, active| {
                    active.generation == segment.generation()
                });
            results.push(generated);
        }
        results
    }

    /// Number of tasks queued or executing.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Returns `true` if a task for `index` is pending.
    pub fn is_pending(&self, index: i64) -> bool {
        self.active_tasks.contains_key(&index)
    }

    /// Number of indices with a pending task.
    pub fn pending_count(&self) -> usize {
        self.active_tasks.len()
    }
}

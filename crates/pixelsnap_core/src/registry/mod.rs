//! # Snap Registry
//!
//! Owns the fixed-capacity table of tracked entities and runs the per-frame
//! snapping kernel over it.
//!
//! ## Contract
//!
//! - `register` hands out the lowest free slot, or fails with
//!   [`SnapError::CapacityExceeded`] without touching state.
//! - Every other operation tolerates stale and out-of-range handles: mutators
//!   become no-ops and reads return [`Vec3::ZERO`].
//! - `run_frame_update` runs once per frame after all moves are queued, then
//!   fires the "positions updated" broadcast exactly once.

mod kernel;
mod shared;
mod slot;

use pixelsnap_shared::Vec3;

use crate::camera::CameraFrame;
use crate::config::SnapConfig;
use crate::error::{SnapError, SnapResult};
use crate::memory::SlotTable;
use crate::observer::{ObserverList, SubscriptionId};

pub use shared::{SharedRegistry, WeakRegistry};
pub use slot::{SlotHandle, TrackedEntry};

/// Outcome of one [`SnapRegistry::run_frame_update`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Zero-based index of the pass.
    pub frame: u64,
    /// Live entries at the time of the pass.
    pub live: usize,
    /// Entries whose snapped position was recomputed.
    pub updated: usize,
    /// Live entries with nothing queued.
    pub idle: usize,
    /// Entries whose projection degenerated; their snapped value was kept.
    pub failed: usize,
    /// Whether the pass fanned out across the rayon pool.
    pub parallel: bool,
}

/// Fixed-capacity registry of tracked entities.
///
/// The registry is the only owner of the slot table. Observers subscribed
/// through [`SnapRegistry::subscribe`] receive `&SnapRegistry` after every
/// pass and read their slots through the accessor methods.
pub struct SnapRegistry {
    slots: SlotTable<TrackedEntry>,
    observers: ObserverList<SnapRegistry>,
    parallel_threshold: usize,
    frames_run: u64,
}

impl SnapRegistry {
    /// Creates a registry with room for `capacity` entities.
    ///
    /// Uses the default parallel threshold.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_parallel_threshold(capacity, pixelsnap_shared::DEFAULT_PARALLEL_THRESHOLD)
    }

    /// Creates a registry that parallelizes once `threshold` entries are live.
    #[must_use]
    pub fn with_parallel_threshold(capacity: usize, threshold: usize) -> Self {
        Self {
            slots: SlotTable::new(capacity),
            observers: ObserverList::with_capacity(capacity),
            parallel_threshold: threshold,
            frames_run: 0,
        }
    }

    /// Creates a registry from configuration.
    #[must_use]
    pub fn from_config(config: &SnapConfig) -> Self {
        Self::with_parallel_threshold(config.capacity, config.parallel_threshold)
    }

    /// Maximum number of simultaneously tracked entities.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of live entries.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.slots.live_count()
    }

    /// Number of kernel passes run so far.
    #[inline]
    #[must_use]
    pub const fn frames_run(&self) -> u64 {
        self.frames_run
    }

    /// Starts tracking an entity anchored at `initial_position`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::CapacityExceeded`] when every slot is taken.
    pub fn register(&mut self, initial_position: Vec3) -> SnapResult<SlotHandle> {
        match self.slots.allocate(TrackedEntry::new(initial_position)) {
            Some(index) => {
                let handle = SlotHandle::from_index(index);
                tracing::trace!(%handle, "registered tracked entity");
                Ok(handle)
            }
            None => {
                let capacity = self.capacity();
                tracing::warn!(capacity, "snap registry is full; increase its capacity");
                Err(SnapError::CapacityExceeded { capacity })
            }
        }
    }

    /// Stops tracking an entity.
    ///
    /// Returns whether a live slot was released. Stale, duplicate and
    /// out-of-range handles are ignored.
    pub fn unregister(&mut self, handle: SlotHandle) -> bool {
        let released = self.slots.free(handle.index()).is_some();
        if released {
            tracing::trace!(%handle, "unregistered tracked entity");
        }
        released
    }

    /// Queues `delta` for the next kernel pass.
    ///
    /// Overwrites any delta already queued this frame: callers move each
    /// handle at most once per frame.
    pub fn queue_move(&mut self, handle: SlotHandle, delta: Vec3) {
        if let Some(entry) = self.slots.get_mut(handle.index()) {
            entry.pending_delta = delta;
        }
    }

    /// Rebases an entity: new anchor, zero accumulated delta.
    ///
    /// The snapped position is left alone until the next pass that moves it.
    pub fn reset_anchor(&mut self, handle: SlotHandle, initial_position: Vec3) {
        if let Some(entry) = self.slots.get_mut(handle.index()) {
            entry.initial_position = initial_position;
            entry.accumulated_delta = Vec3::ZERO;
        }
    }

    /// Unsnapped position, or zero for an invalid handle.
    #[must_use]
    pub fn real_position(&self, handle: SlotHandle) -> Vec3 {
        self.slots
            .get(handle.index())
            .map_or(Vec3::ZERO, TrackedEntry::real_position)
    }

    /// Pixel-aligned position, or zero for an invalid handle.
    #[must_use]
    pub fn snapped_position(&self, handle: SlotHandle) -> Vec3 {
        self.slots
            .get(handle.index())
            .map_or(Vec3::ZERO, |entry| entry.snapped_position)
    }

    /// Copy of a live entry.
    #[must_use]
    pub fn entry(&self, handle: SlotHandle) -> Option<TrackedEntry> {
        self.slots.get(handle.index()).copied()
    }

    /// Checks if `handle` refers to a live slot.
    #[must_use]
    pub fn is_live(&self, handle: SlotHandle) -> bool {
        self.slots.is_live(handle.index())
    }

    /// Subscribes to the "positions updated" broadcast.
    ///
    /// Observers run in subscription order while the registry is borrowed;
    /// they read through the `&SnapRegistry` they are given.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&SnapRegistry) + Send + Sync + 'static,
    {
        self.observers.subscribe(observer)
    }

    /// Removes a broadcast observer. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Number of broadcast observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Runs the kernel over every live slot, then broadcasts once.
    pub fn run_frame_update(&mut self, camera: &CameraFrame) -> FrameReport {
        let live = self.slots.live_count();
        let parallel = live >= self.parallel_threshold;

        let counts = if parallel {
            kernel::run_parallel(self.slots.slots_mut(), camera)
        } else {
            kernel::run_sequential(self.slots.slots_mut(), camera)
        };

        let report = FrameReport {
            frame: self.frames_run,
            live,
            updated: counts.updated,
            idle: counts.idle,
            failed: counts.failed,
            parallel,
        };
        self.frames_run += 1;

        if report.failed > 0 {
            tracing::warn!(
                frame = report.frame,
                failed = report.failed,
                "entities could not be projected; kept their previous snapped positions"
            );
        }

        let this: &Self = self;
        this.observers.notify(this);
        report
    }

    /// Like [`SnapRegistry::run_frame_update`], for drivers that may not have
    /// a camera this tick.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::MissingCameraFrame`] when `camera` is `None`.
    /// Queued deltas are kept and no broadcast fires.
    pub fn try_run_frame_update(&mut self, camera: Option<&CameraFrame>) -> SnapResult<FrameReport> {
        match camera {
            Some(camera) => Ok(self.run_frame_update(camera)),
            None => {
                let frame = self.frames_run;
                tracing::error!(frame, "frame update requested without a camera frame");
                Err(SnapError::MissingCameraFrame { frame })
            }
        }
    }
}

impl std::fmt::Debug for SnapRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapRegistry")
            .field("slots", &self.slots)
            .field("observers", &self.observers)
            .field("parallel_threshold", &self.parallel_threshold)
            .field("frames_run", &self.frames_run)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ScreenSize;
    use parking_lot::Mutex;
    use pixelsnap_shared::Mat4;
    use std::sync::Arc;

    fn camera() -> CameraFrame {
        let view = Mat4::look_to_rh(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z, Vec3::Y);
        CameraFrame::orthographic(view, 6.75, ScreenSize::new(384, 216), 0.1, 100.0).unwrap()
    }

    #[test]
    fn test_register_initializes_entry() {
        let mut registry = SnapRegistry::new(4);
        let h = registry.register(Vec3::new(1.0, 2.0, 3.0)).unwrap();

        let entry = registry.entry(h).unwrap();
        assert_eq!(entry.initial_position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(entry.accumulated_delta, Vec3::ZERO);
        assert_eq!(entry.pending_delta, Vec3::ZERO);
        assert_eq!(entry.snapped_position, Vec3::ZERO);
        assert!(registry.is_live(h));
    }

    #[test]
    fn test_capacity_boundary_and_reuse() {
        let mut registry = SnapRegistry::new(3);
        let handles: Vec<_> = (0..3).map(|_| registry.register(Vec3::ZERO).unwrap()).collect();
        assert_eq!(
            registry.register(Vec3::ZERO),
            Err(SnapError::CapacityExceeded { capacity: 3 })
        );

        registry.unregister(handles[2]);
        registry.unregister(handles[0]);
        assert_eq!(registry.register(Vec3::ZERO).unwrap().index(), 0);
        assert_eq!(registry.register(Vec3::ZERO).unwrap().index(), 2);
    }

    #[test]
    fn test_invalid_handles_are_noops() {
        let mut registry = SnapRegistry::new(2);
        let live = registry.register(Vec3::X).unwrap();

        let bad_handles = [
            SlotHandle::INVALID,
            SlotHandle::from_raw(-1),
            SlotHandle::from_index(2),
            SlotHandle::from_index(1_000),
        ];
        for bad in bad_handles {
            registry.queue_move(bad, Vec3::Y);
            registry.reset_anchor(bad, Vec3::Y);
            assert_eq!(registry.real_position(bad), Vec3::ZERO);
            assert_eq!(registry.snapped_position(bad), Vec3::ZERO);
            assert!(!registry.unregister(bad));
            assert!(registry.entry(bad).is_none());
        }
        assert_eq!(registry.real_position(live), Vec3::X);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_dead_slot_reads_zero() {
        let mut registry = SnapRegistry::new(1);
        let h = registry.register(Vec3::new(3.0, 3.0, 3.0)).unwrap();
        registry.unregister(h);

        assert_eq!(registry.real_position(h), Vec3::ZERO);
        registry.queue_move(h, Vec3::X);
        assert!(registry.entry(h).is_none());
        assert!(!registry.unregister(h));
    }

    #[test]
    fn test_queue_move_last_write_wins() {
        let mut registry = SnapRegistry::new(1);
        let h = registry.register(Vec3::ZERO).unwrap();

        registry.queue_move(h, Vec3::new(1.0, 0.0, 0.0));
        registry.queue_move(h, Vec3::new(0.0, 2.0, 0.0));
        registry.run_frame_update(&camera());

        assert_eq!(registry.real_position(h), Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_reset_anchor_leaves_snapped_position() {
        let camera = camera();
        let mut registry = SnapRegistry::new(1);
        let h = registry.register(Vec3::ZERO).unwrap();
        registry.queue_move(h, Vec3::new(1.0, 0.0, 0.0));
        registry.run_frame_update(&camera);
        let snapped = registry.snapped_position(h);

        registry.reset_anchor(h, Vec3::new(5.0, 5.0, 0.0));
        let entry = registry.entry(h).unwrap();
        assert_eq!(entry.accumulated_delta, Vec3::ZERO);
        assert_eq!(registry.real_position(h), Vec3::new(5.0, 5.0, 0.0));
        assert_eq!(registry.snapped_position(h), snapped);
    }

    #[test]
    fn test_zero_delta_frame_is_idempotent() {
        let camera = camera();
        let mut registry = SnapRegistry::new(4);
        let a = registry.register(Vec3::ZERO).unwrap();
        let b = registry.register(Vec3::new(1.0, 1.0, 0.0)).unwrap();
        registry.queue_move(a, Vec3::new(0.31, 0.17, 0.0));
        registry.queue_move(b, Vec3::new(-0.2, 0.4, 0.0));
        registry.run_frame_update(&camera);
        let before = (registry.snapped_position(a), registry.snapped_position(b));

        let report = registry.run_frame_update(&camera);

        assert_eq!(report.updated, 0);
        assert_eq!(report.idle, 2);
        assert_eq!((registry.snapped_position(a), registry.snapped_position(b)), before);
    }

    #[test]
    fn test_broadcast_fires_once_per_frame() {
        let mut registry = SnapRegistry::new(8);
        for _ in 0..5 {
            let h = registry.register(Vec3::ZERO).unwrap();
            registry.queue_move(h, Vec3::X);
        }

        let calls = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&calls);
        registry.subscribe(move |_| *counter.lock() += 1);

        registry.run_frame_update(&camera());
        assert_eq!(*calls.lock(), 1);
        registry.run_frame_update(&camera());
        assert_eq!(*calls.lock(), 2);
    }

    #[test]
    fn test_observers_see_updated_positions() {
        let mut registry = SnapRegistry::new(2);
        let h = registry.register(Vec3::ZERO).unwrap();
        registry.queue_move(h, Vec3::new(0.1, 0.0, 0.0));

        let seen = Arc::new(Mutex::new(Vec3::ZERO));
        let sink = Arc::clone(&seen);
        registry.subscribe(move |r: &SnapRegistry| *sink.lock() = r.snapped_position(h));

        registry.run_frame_update(&camera());
        assert!((seen.lock().x - 0.125).abs() < 1e-5);
    }

    #[test]
    fn test_missing_camera_keeps_pending_moves() {
        let mut registry = SnapRegistry::new(1);
        let h = registry.register(Vec3::ZERO).unwrap();
        registry.queue_move(h, Vec3::X);

        assert_eq!(
            registry.try_run_frame_update(None),
            Err(SnapError::MissingCameraFrame { frame: 0 })
        );
        assert!(registry.entry(h).unwrap().has_pending_move());

        let report = registry.try_run_frame_update(Some(&camera())).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(registry.real_position(h), Vec3::X);
    }

    #[test]
    fn test_parallel_threshold_selects_rayon_pass() {
        let camera = camera();
        let mut registry = SnapRegistry::with_parallel_threshold(16, 4);
        for i in 0..3 {
            #[allow(clippy::cast_precision_loss)]
            let h = registry.register(Vec3::new(i as f32, 0.0, 0.0)).unwrap();
            registry.queue_move(h, Vec3::Y);
        }
        assert!(!registry.run_frame_update(&camera).parallel);

        let h = registry.register(Vec3::ZERO).unwrap();
        registry.queue_move(h, Vec3::Y);
        let report = registry.run_frame_update(&camera);
        assert!(report.parallel);
        assert_eq!(report.updated, 1);
        assert_eq!(report.frame, 1);
    }
}

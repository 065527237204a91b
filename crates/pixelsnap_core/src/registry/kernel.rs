//! # Snap Kernel
//!
//! The per-frame pass over the slot table. Each slot reads only itself and
//! the shared read-only [`CameraFrame`], and writes only itself, so the pass
//! fans out across threads with no synchronization between entries.

use rayon::prelude::*;

use pixelsnap_shared::Vec3;

use super::slot::TrackedEntry;
use crate::camera::CameraFrame;

/// Minimum slots per rayon task; smaller splits cost more than they save.
const MIN_SLOTS_PER_TASK: usize = 256;

/// What one slot did during a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// Dead slot.
    Dead,
    /// Live, nothing queued; snapped position kept.
    Idle,
    /// Delta applied and snapped position recomputed.
    Snapped,
    /// Delta applied but the projection degenerated; snapped position kept.
    Failed,
}

/// Tallies for one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct PassCounts {
    pub updated: usize,
    pub idle: usize,
    pub failed: usize,
}

impl PassCounts {
    fn of(outcome: StepOutcome) -> Self {
        let mut counts = Self::default();
        match outcome {
            StepOutcome::Dead => {}
            StepOutcome::Idle => counts.idle = 1,
            StepOutcome::Snapped => counts.updated = 1,
            StepOutcome::Failed => counts.failed = 1,
        }
        counts
    }

    fn merge(self, other: Self) -> Self {
        Self {
            updated: self.updated + other.updated,
            idle: self.idle + other.idle,
            failed: self.failed + other.failed,
        }
    }
}

/// Applies the queued delta of one entry and re-snaps it.
///
/// 1. `accumulated += pending`
/// 2. `real = initial + accumulated`
/// 3. project, round x/y to the pixel grid, un-project with the original depth
/// 4. store the snapped position, zero `pending`
#[inline]
pub(crate) fn step(entry: &mut TrackedEntry, camera: &CameraFrame) -> StepOutcome {
    if !entry.has_pending_move() {
        return StepOutcome::Idle;
    }

    entry.accumulated_delta += entry.pending_delta;
    entry.pending_delta = Vec3::ZERO;

    match camera.snap(entry.real_position()) {
        Some(snapped) => {
            entry.snapped_position = snapped;
            StepOutcome::Snapped
        }
        None => StepOutcome::Failed,
    }
}

#[inline]
fn step_slot(slot: &mut Option<TrackedEntry>, camera: &CameraFrame) -> StepOutcome {
    match slot {
        Some(entry) => step(entry, camera),
        None => StepOutcome::Dead,
    }
}

/// Runs the pass on the calling thread.
pub(crate) fn run_sequential(slots: &mut [Option<TrackedEntry>], camera: &CameraFrame) -> PassCounts {
    slots
        .iter_mut()
        .map(|slot| PassCounts::of(step_slot(slot, camera)))
        .fold(PassCounts::default(), PassCounts::merge)
}

/// Runs the pass on the rayon pool.
pub(crate) fn run_parallel(slots: &mut [Option<TrackedEntry>], camera: &CameraFrame) -> PassCounts {
    slots
        .par_iter_mut()
        .with_min_len(MIN_SLOTS_PER_TASK)
        .map(|slot| PassCounts::of(step_slot(slot, camera)))
        .reduce(PassCounts::default, PassCounts::merge)
}

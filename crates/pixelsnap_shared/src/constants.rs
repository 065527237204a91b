//! # Engine Constants
//!
//! Defaults shared by the registry, the frame driver and the camera rig.
//! Runtime configuration overrides all of these.

// =============================================================================
// TARGET RESOLUTION
// =============================================================================

/// Default low-resolution target width in pixels.
pub const DEFAULT_SCREEN_WIDTH: u32 = 384;

/// Default low-resolution target height in pixels.
pub const DEFAULT_SCREEN_HEIGHT: u32 = 216;

/// Default art density (sprite pixels per world unit).
pub const DEFAULT_PIXELS_PER_UNIT: u32 = 16;

// =============================================================================
// REGISTRY
// =============================================================================

/// Default number of simultaneously tracked entities.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Live-entry count at which the kernel fans out across worker threads.
///
/// Below this the per-frame pass runs on the calling thread.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Magnitude of the forward nudge a new handle queues on registration.
///
/// Small enough to never move an entity by a visible amount, large enough to
/// be non-zero so the first frame computes a snapped position.
pub const WARMUP_NUDGE: f32 = 0.000_001;

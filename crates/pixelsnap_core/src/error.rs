//! # Snap Error Types
//!
//! Only capacity and driver-sequencing problems are errors. Stale or
//! out-of-range handles are not: they degrade to no-ops and zero reads.

use thiserror::Error;

/// Errors that can occur in the snapping engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapError {
    /// Registration attempted with every slot occupied.
    #[error("snap registry is full: capacity {capacity}")]
    CapacityExceeded {
        /// Configured capacity of the registry.
        capacity: usize,
    },

    /// The kernel was asked to run without a camera frame for the tick.
    ///
    /// Indicates the frame driver skipped `submit_camera` for this frame.
    #[error("no camera frame submitted for frame {frame}")]
    MissingCameraFrame {
        /// Frame index the update was requested for.
        frame: u64,
    },

    /// A camera frame could not be built from the supplied matrices.
    #[error("invalid camera frame: {0}")]
    InvalidCameraFrame(&'static str),

    /// Invalid configuration file or value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The registry a handle was bound to has been dropped.
    #[error("snap registry is no longer available")]
    RegistryUnavailable,
}

/// Result type for snapping operations.
pub type SnapResult<T> = Result<T, SnapError>;

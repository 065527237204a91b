//! # Camera Snapshot
//!
//! The per-frame, read-only view of the camera the kernel projects through.
//!
//! ## Screen Space
//!
//! ```text
//!  (0,0) ───────────────> x (pixels)
//!    │
//!    │     NDC y grows up, screen y grows down:
//!    │     py = (1 - (ndc.y + 1) / 2) * height
//!    ▼
//!    y
//! ```

mod frame;

use serde::{Deserialize, Serialize};

use pixelsnap_shared::{DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH};

pub use frame::CameraFrame;

/// Target pixel resolution of the low-resolution render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ScreenSize {
    /// Creates a new screen size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self::new(DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT)
    }
}

/// Rounds a screen coordinate to the pixel grid.
///
/// Nearest integer, ties to even: `2.5 -> 2`, `3.5 -> 4`, `-0.5 -> -0`.
#[inline]
#[must_use]
pub fn snap_to_pixel(coord: f32) -> f32 {
    coord.round_ties_even()
}

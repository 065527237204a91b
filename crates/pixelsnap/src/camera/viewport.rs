//! # Viewport Compensation
//!
//! The scene is rendered at the low target resolution from a pixel-snapped
//! camera, then upscaled to the window. Snapping the camera drops a
//! sub-pixel remainder; shifting the upscaled image by that remainder,
//! measured in window pixels, keeps camera motion smooth.
//!
//! ```text
//! offset = -(real - snapped).xz          world units
//! anchor = pixel_ratio * offset          window pixels
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use pixelsnap_core::{PositionUpdate, ScreenSize, SnapError, SnapResult, SubscriptionId, TrackedEntity};
use pixelsnap_shared::{Vec2, DEFAULT_PIXELS_PER_UNIT};

/// Target render resolution against the window it is shown in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolutionSettings {
    /// Low-resolution render target.
    pub target: ScreenSize,
    /// Output window.
    pub window: ScreenSize,
    /// Art density: sprite pixels per world unit.
    pub pixels_per_unit: u32,
    /// Whether the window covers the whole display.
    pub fullscreen: bool,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            target: ScreenSize::default(),
            window: ScreenSize::new(1920, 1080),
            pixels_per_unit: DEFAULT_PIXELS_PER_UNIT,
            fullscreen: false,
        }
    }
}

impl ResolutionSettings {
    /// Settings for a target shown in `window`.
    #[must_use]
    pub fn new(target: ScreenSize, window: ScreenSize) -> Self {
        Self {
            target,
            window,
            ..Self::default()
        }
    }

    /// Checks that both resolutions and the pixel density are non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidConfig`] otherwise.
    pub fn validate(&self) -> SnapResult<()> {
        if self.target.is_empty() || self.window.is_empty() {
            return Err(SnapError::InvalidConfig(format!(
                "resolution: target {}x{} and window {}x{} must be non-zero",
                self.target.width, self.target.height, self.window.width, self.window.height
            )));
        }
        if self.pixels_per_unit == 0 {
            return Err(SnapError::InvalidConfig("resolution: pixels_per_unit must be non-zero".into()));
        }
        Ok(())
    }

    /// Window pixels per target pixel on each axis.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn pixel_ratio(&self) -> Vec2 {
        Vec2::new(
            self.window.width as f32 / self.target.width as f32,
            self.window.height as f32 / self.target.height as f32,
        )
    }

    /// Camera viewport rect size, normalized to the window, that preserves
    /// the target aspect ratio. The larger axis is `1.0`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn viewport_rect(&self) -> Vec2 {
        let normalized = Vec2::new(
            self.target.width as f32 / self.window.width as f32,
            self.target.height as f32 / self.window.height as f32,
        );
        normalized * (1.0 / normalized.x.max(normalized.y))
    }

    /// Size of the upscaled image in window pixels.
    ///
    /// Fullscreen adds one target pixel on every edge so the compensation
    /// shift never exposes the border.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn blit_size(&self) -> Vec2 {
        let window = Vec2::new(self.window.width as f32, self.window.height as f32);
        if self.fullscreen {
            let margin = self.pixel_ratio() * 2.0;
            Vec2::new(window.x + margin.x, window.y + margin.y)
        } else {
            window
        }
    }

    /// Orthographic half-height that shows `pixels_per_unit` art pixels per
    /// world unit at the target resolution.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn ortho_size(&self) -> f32 {
        self.target.height as f32 / (2.0 * self.pixels_per_unit as f32)
    }

    /// World units covered by one target pixel for `ortho_size`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn world_units_per_pixel(&self, ortho_size: f32) -> f32 {
        ortho_size * 2.0 / self.target.height as f32
    }
}

/// Latest compensation values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportOffset {
    /// Negated sub-pixel remainder on the ground plane, in world units.
    pub offset: Vec2,
    /// The same shift in window pixels, for the blit anchor.
    pub anchor: Vec2,
}

#[derive(Debug, Default)]
struct CompensatorState {
    pixel_ratio: Vec2,
    offset: Vec2,
}

/// Listens to a camera entity and tracks the blit shift.
#[derive(Debug)]
pub struct ViewportCompensator {
    state: Arc<Mutex<CompensatorState>>,
    subscription: SubscriptionId,
}

impl ViewportCompensator {
    /// Subscribes to `camera`'s position updates.
    #[must_use]
    pub fn attach(camera: &TrackedEntity, pixel_ratio: Vec2) -> Self {
        let state = Arc::new(Mutex::new(CompensatorState {
            pixel_ratio,
            offset: Vec2::ZERO,
        }));

        let sink = Arc::clone(&state);
        let subscription = camera.subscribe(move |update: &PositionUpdate| {
            sink.lock().offset = remainder_offset(update);
        });

        Self { state, subscription }
    }

    /// Stops listening.
    pub fn detach(self, camera: &TrackedEntity) {
        camera.unsubscribe(self.subscription);
    }

    /// Changes the window-to-target ratio, e.g. after a resize.
    pub fn set_pixel_ratio(&self, pixel_ratio: Vec2) {
        self.state.lock().pixel_ratio = pixel_ratio;
    }

    /// Offset and anchor from the most recent update.
    #[must_use]
    pub fn current(&self) -> ViewportOffset {
        let state = self.state.lock();
        ViewportOffset {
            offset: state.offset,
            anchor: state.pixel_ratio * state.offset,
        }
    }
}

fn remainder_offset(update: &PositionUpdate) -> Vec2 {
    Vec2::new(
        -(update.real.x - update.snapped.x),
        -(update.real.z - update.snapped.z),
    )
}

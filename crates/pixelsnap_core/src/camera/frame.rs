//! Validated camera snapshot with cached inverse matrices.

use pixelsnap_shared::{Mat4, Vec3};

use super::{snap_to_pixel, ScreenSize};
use crate::error::{SnapError, SnapResult};

/// View, projection and target resolution for one frame.
///
/// Built fresh by the frame driver every tick and read by the kernel. The
/// inverses are computed once here rather than once per entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrame {
    view: Mat4,
    projection: Mat4,
    inverse_view: Mat4,
    inverse_projection: Mat4,
    screen: ScreenSize,
    width: f32,
    height: f32,
}

impl CameraFrame {
    /// Creates a camera frame.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidCameraFrame`] if the resolution is empty,
    /// a matrix has non-finite elements, or either matrix is singular.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(view: Mat4, projection: Mat4, screen: ScreenSize) -> SnapResult<Self> {
        if screen.is_empty() {
            return Err(SnapError::InvalidCameraFrame("screen resolution must be non-zero"));
        }
        if !view.is_finite() || !projection.is_finite() {
            return Err(SnapError::InvalidCameraFrame("matrix has non-finite elements"));
        }
        let inverse_view = view
            .inverse()
            .ok_or(SnapError::InvalidCameraFrame("view matrix is singular"))?;
        let inverse_projection = projection
            .inverse()
            .ok_or(SnapError::InvalidCameraFrame("projection matrix is singular"))?;

        Ok(Self {
            view,
            projection,
            inverse_view,
            inverse_projection,
            screen,
            width: screen.width as f32,
            height: screen.height as f32,
        })
    }

    /// Orthographic camera whose vertical half-extent is `ortho_size` world units.
    ///
    /// The horizontal extent follows the screen's aspect ratio.
    ///
    /// # Errors
    ///
    /// Same as [`CameraFrame::new`]; also fails for a non-positive size or
    /// an empty depth range.
    pub fn orthographic(
        view: Mat4,
        ortho_size: f32,
        screen: ScreenSize,
        near: f32,
        far: f32,
    ) -> SnapResult<Self> {
        if ortho_size <= 0.0 || far <= near {
            return Err(SnapError::InvalidCameraFrame("degenerate orthographic volume"));
        }
        if screen.is_empty() {
            return Err(SnapError::InvalidCameraFrame("screen resolution must be non-zero"));
        }
        let half_width = ortho_size * screen.aspect();
        let projection =
            Mat4::orthographic_rh_gl(-half_width, half_width, -ortho_size, ortho_size, near, far);
        Self::new(view, projection, screen)
    }

    /// World-to-camera matrix.
    #[inline]
    #[must_use]
    pub const fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Camera-to-clip matrix.
    #[inline]
    #[must_use]
    pub const fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Target resolution.
    #[inline]
    #[must_use]
    pub const fn screen(&self) -> ScreenSize {
        self.screen
    }

    /// Projects a world point to `(pixel x, pixel y, ndc depth)`.
    ///
    /// Pixel origin is the top-left corner. Returns `None` when the point
    /// sits on the camera plane (`clip.w == 0`).
    #[inline]
    #[must_use]
    pub fn world_to_screen(&self, world: Vec3) -> Option<Vec3> {
        let view_pos = self.view.mul_vec4(world.extend(1.0));
        let clip = self.projection.mul_vec4(view_pos);
        let ndc = clip.perspective_divide()?;

        Some(Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - (ndc.y + 1.0) * 0.5) * self.height,
            ndc.z,
        ))
    }

    /// Inverse of [`CameraFrame::world_to_screen`].
    ///
    /// `screen.z` is the NDC depth, not a view distance.
    #[inline]
    #[must_use]
    pub fn screen_to_world(&self, screen: Vec3) -> Option<Vec3> {
        let ndc = Vec3::new(
            2.0 * screen.x / self.width - 1.0,
            1.0 - 2.0 * screen.y / self.height,
            screen.z,
        );
        let view_pos = self
            .inverse_projection
            .mul_vec4(ndc.extend(1.0))
            .perspective_divide()?;
        Some(self.inverse_view.mul_vec4(view_pos.extend(1.0)).truncate())
    }

    /// Projects a world point to viewport space.
    ///
    /// `x` and `y` are in `[0, 1]` across the visible area with `y` growing
    /// up; `z` is NDC depth. Points outside the view fall outside `[0, 1]`.
    #[must_use]
    pub fn world_to_viewport(&self, world: Vec3) -> Option<Vec3> {
        let clip = self.projection.mul_vec4(self.view.mul_vec4(world.extend(1.0)));
        let ndc = clip.perspective_divide()?;
        Some(Vec3::new((ndc.x + 1.0) * 0.5, (ndc.y + 1.0) * 0.5, ndc.z))
    }

    /// Moves a world point onto the nearest pixel centre line of the grid.
    ///
    /// Projects to screen space, rounds x and y with [`snap_to_pixel`], keeps
    /// the unrounded depth and un-projects back to world space. Returns
    /// `None` if either projection degenerates or yields non-finite values.
    #[inline]
    #[must_use]
    pub fn snap(&self, world: Vec3) -> Option<Vec3> {
        let screen = self.world_to_screen(world)?;
        let rounded = Vec3::new(snap_to_pixel(screen.x), snap_to_pixel(screen.y), screen.z);
        self.screen_to_world(rounded).filter(|p| p.is_finite())
    }

    /// World-space width of one screen pixel at the depth of `at`.
    #[must_use]
    pub fn pixel_world_size(&self, at: Vec3) -> Option<f32> {
        let screen = self.world_to_screen(at)?;
        let a = self.screen_to_world(screen)?;
        let b = self.screen_to_world(Vec3::new(screen.x + 1.0, screen.y, screen.z))?;
        Some(a.distance(b))
    }

    /// Half of [`CameraFrame::pixel_world_size`]: the largest per-axis
    /// distance snapping can move a point.
    #[must_use]
    pub fn half_pixel_world_size(&self, at: Vec3) -> Option<f32> {
        self.pixel_world_size(at).map(|size| size * 0.5)
    }
}

//! # Follow Camera Rig
//!
//! A pitched orthographic camera that follows a target across the ground
//! plane and turns in fixed yaw steps. The rig's own position is a
//! [`TrackedEntity`], so the camera itself sits on the pixel grid and the
//! sub-pixel remainder is handed to the [`ViewportCompensator`].
//!
//! ## Follow
//!
//! The target's viewport position is clamped to `[0, 1]` and remapped to
//! `[-1, 1]`. On each axis whose magnitude exceeds `border_threshold` the
//! rig moves along the ground-projected forward (vertical) or right
//! (horizontal) direction, proportionally to how far out the target is.
//!
//! ## Rotation
//!
//! A rotation request adds one `rotation_step_degrees` step to the target
//! yaw. While turning, the rig orbits sideways around the target and pulls
//! the target back towards the centre of the view.

use std::f32::consts::FRAC_PI_2;
use std::path::Path;

use serde::{Deserialize, Serialize};

use pixelsnap_core::{CameraFrame, ScreenSize, SharedRegistry, SnapError, SnapResult, TrackedEntity};
use pixelsnap_shared::{Mat4, Quaternion, Transform, Vec2, Vec3};

use super::viewport::{ResolutionSettings, ViewportCompensator, ViewportOffset};

/// Angle, in degrees, below which a rotation counts as finished.
const ROTATION_EPSILON_DEGREES: f32 = 0.1;

/// Camera rig tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraRigConfig {
    /// Remapped viewport distance from centre beyond which the rig follows.
    pub border_threshold: f32,
    /// Follow speed in world units per second.
    pub speed: f32,
    /// Orbit speed per degree of remaining turn, while rotating.
    pub speed_while_rotating: f32,
    /// Fraction of the remaining turn covered per second.
    pub rotation_speed: f32,
    /// Speed at which the target is pulled back to centre while rotating.
    pub rotation_reach_speed: f32,
    /// Yaw change per rotation request, in degrees.
    pub rotation_step_degrees: f32,
    /// Downward tilt in degrees.
    pub pitch_degrees: f32,
    /// Vertical half-extent of the view in world units.
    pub ortho_size: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
}

impl Default for CameraRigConfig {
    fn default() -> Self {
        Self {
            border_threshold: 0.3,
            speed: 10.0,
            speed_while_rotating: 5.0,
            rotation_speed: 5.0,
            rotation_reach_speed: 40.0,
            rotation_step_degrees: 45.0,
            pitch_degrees: 30.0,
            ortho_size: ResolutionSettings::default().ortho_size(),
            near: 0.3,
            far: 1000.0,
        }
    }
}

impl CameraRigConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidConfig`] on malformed TOML or values
    /// rejected by [`CameraRigConfig::validate`].
    pub fn from_toml_str(source: &str) -> SnapResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| SnapError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidConfig`] if the file cannot be read or
    /// does not parse.
    pub fn load(path: impl AsRef<Path>) -> SnapResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| SnapError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> SnapResult<()> {
        let checks = [
            ("border_threshold", (0.0..1.0).contains(&self.border_threshold)),
            ("speed", self.speed.is_finite() && self.speed >= 0.0),
            (
                "speed_while_rotating",
                self.speed_while_rotating.is_finite() && self.speed_while_rotating >= 0.0,
            ),
            ("rotation_speed", self.rotation_speed.is_finite() && self.rotation_speed > 0.0),
            (
                "rotation_reach_speed",
                self.rotation_reach_speed.is_finite() && self.rotation_reach_speed >= 0.0,
            ),
            (
                "rotation_step_degrees",
                self.rotation_step_degrees > 0.0 && self.rotation_step_degrees < 360.0,
            ),
            ("pitch_degrees", self.pitch_degrees > 0.0 && self.pitch_degrees < 90.0),
            ("ortho_size", self.ortho_size.is_finite() && self.ortho_size > 0.0),
            ("far", self.far.is_finite() && self.near.is_finite() && self.far > self.near),
        ];

        match checks.iter().find(|(_, ok)| !ok) {
            Some((field, _)) => Err(SnapError::InvalidConfig(format!("camera rig: {field} is out of range"))),
            None => Ok(()),
        }
    }
}

/// Direction of a rotation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RotateDirection {
    /// Turn counter-clockwise seen from above.
    Left,
    /// Turn clockwise seen from above.
    Right,
}

impl RotateDirection {
    /// Sign applied to the yaw step.
    const fn yaw_sign(self) -> f32 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
        }
    }

    /// Sign of the quarter turn from "towards target" to the orbit direction.
    const fn orbit_sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// Pixel-snapped follow camera.
pub struct CameraRig {
    config: CameraRigConfig,
    entity: TrackedEntity,
    compensator: ViewportCompensator,
    /// Current yaw in degrees, kept in `[0, 360)`.
    yaw: f32,
    /// Yaw being turned towards.
    target_yaw: f32,
    rotating: Option<RotateDirection>,
    /// Distance to `target_yaw` after the last rotation step, in degrees.
    remaining_angle: f32,
}

impl CameraRig {
    /// Registers the rig at `position` facing `yaw_degrees`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidConfig`] for a bad `config` and
    /// [`SnapError::CapacityExceeded`] if the registry is full.
    pub fn new(
        registry: &SharedRegistry,
        position: Vec3,
        yaw_degrees: f32,
        config: CameraRigConfig,
        resolution: &ResolutionSettings,
    ) -> SnapResult<Self> {
        config.validate()?;
        let yaw = yaw_degrees.rem_euclid(360.0);
        let rotation = orientation(yaw, config.pitch_degrees);

        let entity = TrackedEntity::new(registry, Transform::new(position, rotation, 1.0))?;
        let compensator = ViewportCompensator::attach(&entity, resolution.pixel_ratio());

        tracing::debug!(slot = %entity.slot(), yaw, "camera rig registered");

        Ok(Self {
            config,
            entity,
            compensator,
            yaw,
            target_yaw: yaw,
            rotating: None,
            remaining_angle: 0.0,
        })
    }

    /// Tuning in use.
    #[must_use]
    pub const fn config(&self) -> &CameraRigConfig {
        &self.config
    }

    /// The rig's tracked entity.
    #[must_use]
    pub const fn entity(&self) -> &TrackedEntity {
        &self.entity
    }

    /// Current yaw in degrees.
    #[must_use]
    pub const fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Checks if a rotation is in progress.
    #[must_use]
    pub const fn is_rotating(&self) -> bool {
        self.rotating.is_some()
    }

    /// Latest sub-pixel compensation for the upscaled blit.
    #[must_use]
    pub fn viewport_offset(&self) -> ViewportOffset {
        self.compensator.current()
    }

    /// Updates the pixel ratio used for the blit anchor.
    pub fn set_resolution(&self, resolution: &ResolutionSettings) {
        self.compensator.set_pixel_ratio(resolution.pixel_ratio());
    }

    /// Starts a yaw step. Ignored while a rotation is already running.
    ///
    /// Returns whether the request was accepted.
    pub fn request_rotation(&mut self, direction: RotateDirection) -> bool {
        if self.rotating.is_some() {
            return false;
        }
        self.target_yaw += direction.yaw_sign() * self.config.rotation_step_degrees;
        self.rotating = Some(direction);
        tracing::debug!(?direction, target_yaw = self.target_yaw, "camera rotation started");
        true
    }

    /// Queues this frame's camera move and advances any rotation.
    ///
    /// `camera` is the frame the target is currently seen through.
    pub fn update(&mut self, camera: &CameraFrame, target: Vec3, delta_time: f32) {
        match self.rotating {
            None => self.follow(camera, target, delta_time),
            Some(direction) => self.orbit(camera, target, direction, delta_time),
        }
        self.rotate(delta_time);
    }

    /// Camera frame seen from the rig's snapped position.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidCameraFrame`] if the matrices degenerate.
    pub fn camera_frame(&self, screen: ScreenSize) -> SnapResult<CameraFrame> {
        let eye = self.entity.transform().position;
        let view = Mat4::look_to_rh(eye, self.forward(), Vec3::Y);
        CameraFrame::orthographic(view, self.config.ortho_size, screen, self.config.near, self.config.far)
    }

    /// View direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        orientation(self.yaw, self.config.pitch_degrees).mul_vec3(-Vec3::Z)
    }

    fn flat_forward(&self) -> Vec3 {
        let forward = self.forward();
        Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero()
    }

    /// World-space move that pushes the view by `horizontal`/`vertical`.
    fn reach(&self, horizontal: f32, vertical: f32, speed: f32) -> Vec3 {
        let forward = self.flat_forward();
        let right = forward.cross(Vec3::Y);
        right * (speed * horizontal) + forward * (speed * vertical)
    }

    fn follow(&self, camera: &CameraFrame, target: Vec3, delta_time: f32) {
        let Some(axes) = viewport_axes(camera, target) else {
            return;
        };

        let move_x = axes.x.abs() > self.config.border_threshold;
        let move_z = axes.y.abs() > self.config.border_threshold;
        if !move_x && !move_z {
            return;
        }

        let horizontal = if move_x { axes.x } else { 0.0 };
        let vertical = if move_z { axes.y } else { 0.0 };
        let delta = self.reach(horizontal, vertical, self.config.speed) * delta_time;
        self.entity.move_by(delta);
    }

    fn orbit(&self, camera: &CameraFrame, target: Vec3, direction: RotateDirection, delta_time: f32) {
        let eye = self.entity.transform().position;
        let to_target = Vec3::new(target.x - eye.x, 0.0, target.z - eye.z).normalize_or_zero();
        let side = Quaternion::from_rotation_y(direction.orbit_sign() * FRAC_PI_2).mul_vec3(to_target);

        let axes = viewport_axes(camera, target).unwrap_or(Vec2::ZERO);
        let pull = self.reach(axes.x, axes.y, self.config.rotation_reach_speed);

        let sweep = self.remaining_angle.min(360.0 - self.remaining_angle);
        let delta = (side * (sweep * self.config.speed_while_rotating) + pull) * delta_time;
        self.entity.move_by(delta);
    }

    fn rotate(&mut self, delta_time: f32) {
        if self.rotating.is_none() {
            return;
        }

        let next = lerp_angle(self.yaw, self.target_yaw, self.config.rotation_speed * delta_time);
        self.remaining_angle = (next - self.target_yaw).abs() % 360.0;
        self.yaw = next.rem_euclid(360.0);

        if within_angle(self.remaining_angle, ROTATION_EPSILON_DEGREES) {
            self.target_yaw = self.target_yaw.rem_euclid(360.0);
            self.yaw = self.target_yaw;
            self.remaining_angle = 0.0;
            self.rotating = None;
            tracing::debug!(yaw = self.yaw, "camera rotation finished");
        }

        self.entity
            .set_orientation(orientation(self.yaw, self.config.pitch_degrees), 1.0);
    }
}

impl std::fmt::Debug for CameraRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraRig")
            .field("entity", &self.entity)
            .field("yaw", &self.yaw)
            .field("target_yaw", &self.target_yaw)
            .field("rotating", &self.rotating)
            .finish_non_exhaustive()
    }
}

fn orientation(yaw_degrees: f32, pitch_degrees: f32) -> Quaternion {
    Quaternion::from_yaw_pitch(yaw_degrees.to_radians(), -pitch_degrees.to_radians())
}

/// Target position in viewport space, clamped and remapped to `[-1, 1]`.
fn viewport_axes(camera: &CameraFrame, target: Vec3) -> Option<Vec2> {
    let viewport = camera.world_to_viewport(target)?;
    Some(Vec2::new(
        (viewport.x.clamp(0.0, 1.0) - 0.5) * 2.0,
        (viewport.y.clamp(0.0, 1.0) - 0.5) * 2.0,
    ))
}

/// Interpolates between two angles in degrees along the shorter arc.
fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let mut delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    from + delta * t.clamp(0.0, 1.0)
}

fn within_angle(angle: f32, threshold: f32) -> bool {
    angle < threshold || angle > 360.0 - threshold
}

//! # Camera
//!
//! Consumers of the snapping core that sit between the game and the
//! renderer:
//!
//! - [`CameraRig`]: follow camera whose own position is pixel-snapped
//! - [`ViewportCompensator`]: turns the camera's sub-pixel remainder into a
//!   blit offset
//! - [`ResolutionSettings`]: target vs window resolution

mod rig;
mod viewport;

pub use rig::{CameraRig, CameraRigConfig, RotateDirection};
pub use viewport::{ResolutionSettings, ViewportCompensator, ViewportOffset};

//! # PIXELSNAP Shared
//!
//! Common math types and constants used by every PIXELSNAP crate.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - a windowing or GPU crate
//! - a threading or locking crate
//!
//! If you need engine types, put them in the crate that talks to the engine.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{
    DEFAULT_CAPACITY, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_PIXELS_PER_UNIT, DEFAULT_SCREEN_HEIGHT,
    DEFAULT_SCREEN_WIDTH, WARMUP_NUDGE,
};
pub use math::{Mat4, Quaternion, Transform, Vec2, Vec3, Vec4};

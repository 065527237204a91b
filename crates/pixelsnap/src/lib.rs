//! # PIXELSNAP
//!
//! Frame driver, camera rig and simulation built on the snapping core.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            PIXELSNAP                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐   │
//! │  │   Movers        │     │   Camera Rig    │     │   Viewport      │   │
//! │  │                 │     │                 │────>│   Compensator   │   │
//! │  │  • Oscillator   │     │  • Follow       │     │                 │   │
//! │  │  • Game logic   │     │  • 45° turns    │     │  • Blit offset  │   │
//! │  └────────┬────────┘     └────────┬────────┘     └─────────────────┘   │
//! │           │ move_by               │ move_by + CameraFrame              │
//! │           ▼                       ▼                                     │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │   Frame Driver ── SnapRegistry (pixelsnap_core) ── broadcast      │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `frame_driver`: Frame orchestration and timing
//! - `camera`: Follow camera, resolution settings, sub-pixel compensation
//! - `movers`: Movement producers for demos and tests
//! - `sim`: Headless simulation

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod camera;
pub mod frame_driver;
pub mod movers;
pub mod sim;

// Re-export the core
pub use pixelsnap_core as core;
pub use pixelsnap_shared as shared;

// Re-export commonly used types
pub use camera::{CameraRig, CameraRigConfig, ResolutionSettings, RotateDirection, ViewportCompensator, ViewportOffset};
pub use frame_driver::{FrameContext, FrameDriver, FrameStats, FrameStatsAccumulator};
pub use movers::Oscillator;
pub use sim::{SimConfig, Simulation};

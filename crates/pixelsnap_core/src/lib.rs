//! # PIXELSNAP Core Engine
//!
//! Pixel-grid snapping for low-resolution cameras, designed for:
//! - Thousands of tracked entities updated in one bulk pass per frame
//! - Sub-pixel jitter removal without disturbing gameplay positions
//! - Zero allocations once the registry is built
//!
//! ## Architecture Rules
//!
//! 1. **Fixed capacity** - The slot table is sized once at construction
//! 2. **Anchored accumulation** - Positions are `anchor + accumulated delta`,
//!    so float error grows with distance travelled, not distance from origin
//! 3. **Snap in screen space** - Project, round to the pixel grid, un-project
//! 4. **Independent entries** - The kernel may fan out across threads
//!
//! ## Frame Order
//!
//! ```text
//! producers ──move()──> TrackedEntity ──queue_move()──> SnapRegistry
//!                                                           │
//!                     run_frame_update(&CameraFrame) ───────┤ kernel pass
//!                                                           │
//!   TrackedEntity <──── "positions updated" broadcast ──────┘
//!        │
//!        └──> per-entity "position updated" observers
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use pixelsnap_core::{CameraFrame, ScreenSize, SharedRegistry, SnapRegistry, TrackedEntity};
//!
//! let registry = SharedRegistry::new(SnapRegistry::new(256));
//! let entity = TrackedEntity::new(&registry, Transform::IDENTITY)?;
//! entity.move_by(Vec3::new(0.25, 0.0, 0.0));
//! registry.run_frame_update(&camera_frame);
//! let on_grid = entity.transform().position;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod camera;
pub mod config;
pub mod error;
pub mod handle;
pub mod memory;
pub mod observer;
pub mod registry;

pub use camera::{snap_to_pixel, CameraFrame, ScreenSize};
pub use config::SnapConfig;
pub use error::{SnapError, SnapResult};
pub use handle::{HandleState, PositionUpdate, TrackedEntity};
pub use memory::SlotTable;
pub use observer::{ObserverList, SubscriptionId};
pub use registry::{FrameReport, SharedRegistry, SlotHandle, SnapRegistry, TrackedEntry, WeakRegistry};

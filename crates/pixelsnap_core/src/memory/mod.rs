//! # Memory Management
//!
//! Pre-allocated slot storage for zero-allocation frame updates.
//!
//! ## Design Philosophy
//!
//! All memory is allocated once when the registry is built. Per frame:
//! - No heap allocations
//! - Stable indices for the lifetime of a registration
//! - Deterministic slot reuse (lowest free index first)

mod slot_table;

pub use slot_table::SlotTable;

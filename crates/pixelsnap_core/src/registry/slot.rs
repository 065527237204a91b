//! Slot handles and the per-entity record the kernel operates on.

use pixelsnap_shared::Vec3;

/// Index of a tracked entity in the registry's slot table.
///
/// Stable for the lifetime of a registration. Handles are plain indices:
/// once unregistered, the index may be handed to a new entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SlotHandle(u32);

impl SlotHandle {
    /// Sentinel that never refers to a slot.
    pub const INVALID: Self = Self(u32::MAX);

    /// Handle for a slot index.
    ///
    /// Indices that do not fit map to [`SlotHandle::INVALID`].
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        u32::try_from(index).map_or(Self::INVALID, Self)
    }

    /// Handle from a signed integer, as stored by engines that use `-1`
    /// for "no slot".
    #[inline]
    #[must_use]
    pub fn from_raw(raw: i64) -> Self {
        u32::try_from(raw).map_or(Self::INVALID, Self)
    }

    /// Slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Checks if this is the sentinel.
    #[inline]
    #[must_use]
    pub const fn is_invalid(self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for SlotHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl std::fmt::Display for SlotHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_invalid() {
            f.write_str("slot(none)")
        } else {
            write!(f, "slot({})", self.0)
        }
    }
}

/// One tracked entity.
///
/// `real = initial_position + accumulated_delta`. Keeping the anchor apart
/// from the running sum bounds float error by distance travelled.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackedEntry {
    /// World-space anchor set at registration or by a reset.
    pub initial_position: Vec3,
    /// Sum of all deltas applied since the last anchor reset.
    pub accumulated_delta: Vec3,
    /// Delta queued this frame; consumed by the kernel.
    pub pending_delta: Vec3,
    /// Last pixel-aligned world position.
    pub snapped_position: Vec3,
}

impl TrackedEntry {
    /// Fresh entry anchored at `initial_position`.
    #[must_use]
    pub const fn new(initial_position: Vec3) -> Self {
        Self {
            initial_position,
            accumulated_delta: Vec3::ZERO,
            pending_delta: Vec3::ZERO,
            snapped_position: Vec3::ZERO,
        }
    }

    /// Unsnapped world position.
    #[inline]
    #[must_use]
    pub fn real_position(&self) -> Vec3 {
        self.initial_position + self.accumulated_delta
    }

    /// True when a move is waiting for the next kernel pass.
    #[inline]
    #[must_use]
    pub fn has_pending_move(&self) -> bool {
        !self.pending_delta.is_zero()
    }
}

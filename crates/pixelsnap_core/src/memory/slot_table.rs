//! # Slot Table
//!
//! Fixed-capacity storage with stable indices and lowest-index reuse.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A fixed-capacity table of optional slots.
///
/// Allocation always hands out the lowest free index, so slot reuse is
/// deterministic regardless of the order slots were freed in. Free indices
/// live in a min-heap sized to the capacity up front, which keeps both
/// allocation and release at O(log n) with no heap growth.
///
/// # Thread Safety
///
/// The table is NOT thread-safe. Its owner wraps it in a lock when it is
/// shared. The slot slice may be handed to a data-parallel pass because
/// every slot is independent.
///
/// # Example
///
/// ```rust,ignore
/// let mut table: SlotTable<Vec3> = SlotTable::new(2);
///
/// let a = table.allocate(Vec3::ZERO)?; // 0
/// let b = table.allocate(Vec3::X)?;    // 1
/// table.free(a);
/// assert_eq!(table.allocate(Vec3::Y), Some(0));
/// ```
pub struct SlotTable<T> {
    /// The storage array. `None` marks a dead slot.
    storage: Box<[Option<T>]>,
    /// Free indices, smallest on top.
    free: BinaryHeap<Reverse<usize>>,
    /// Number of live slots.
    live_count: usize,
}

impl<T> SlotTable<T> {
    /// Creates a new table with the specified capacity.
    ///
    /// All memory is pre-allocated upfront. A zero capacity is allowed and
    /// yields a table on which every allocation fails.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let storage: Vec<Option<T>> = (0..capacity).map(|_| None).collect();

        let mut free = BinaryHeap::with_capacity(capacity);
        free.extend((0..capacity).map(Reverse));

        Self {
            storage: storage.into_boxed_slice(),
            free,
            live_count: 0,
        }
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Returns the number of live slots.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live_count
    }

    /// Returns the number of free slots.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.capacity() - self.live_count
    }

    /// Stores `value` in the lowest free slot.
    ///
    /// Returns the slot index, or `None` if the table is full.
    pub fn allocate(&mut self, value: T) -> Option<usize> {
        let Reverse(index) = self.free.pop()?;

        self.storage[index] = Some(value);
        self.live_count += 1;

        Some(index)
    }

    /// Releases a slot.
    ///
    /// Returns the stored value, or `None` if the index was out of range or
    /// already dead. Releasing twice is harmless.
    pub fn free(&mut self, index: usize) -> Option<T> {
        let value = self.storage.get_mut(index)?.take()?;
        self.free.push(Reverse(index));
        self.live_count -= 1;

        Some(value)
    }

    /// Returns true if `index` holds a live value.
    #[inline]
    #[must_use]
    pub fn is_live(&self, index: usize) -> bool {
        matches!(self.storage.get(index), Some(Some(_)))
    }

    /// Gets a reference to a live slot.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.storage.get(index)?.as_ref()
    }

    /// Gets a mutable reference to a live slot.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.storage.get_mut(index)?.as_mut()
    }

    /// Raw slot slice, dead slots included, for bulk passes.
    #[inline]
    pub fn slots_mut(&mut self) -> &mut [Option<T>] {
        &mut self.storage
    }

    /// Releases every slot.
    ///
    /// This is a **zero-heap-allocation** operation - memory is not freed.
    pub fn clear(&mut self) {
        for slot in self.storage.iter_mut() {
            *slot = None;
        }
        self.free.clear();
        self.free.extend((0..self.storage.len()).map(Reverse));
        self.live_count = 0;
    }

    /// Iterates over all live slots.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.storage
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|v| (index, v)))
    }
}

impl<T> std::fmt::Debug for SlotTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotTable")
            .field("capacity", &self.capacity())
            .field("live_count", &self.live_count)
            .finish()
    }
}

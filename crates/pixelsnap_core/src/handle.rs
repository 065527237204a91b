//! # Tracked Entity Handle
//!
//! Per-object binding to the [`SnapRegistry`]. An entity registers on
//! construction, forwards its moves to the registry, and after each kernel
//! pass copies its snapped position into its own transform before telling
//! its own observers.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ──> PendingMove ──run_frame_update──> Updated ──move_by──> PendingMove
//!                                                │
//!                         teardown() / drop ─────┴──> Unregistered (terminal)
//! ```
//!
//! A failed registration returns an error instead of a handle, so there is
//! no uninitialized handle to observe.
//!
//! ## Locking
//!
//! Entity observers run inside the registry broadcast, with the registry
//! write-locked. Position and transform reads are served from the handle's
//! own copy of the last broadcast, so observers may read any entity. They
//! must not move an entity, subscribe to it, or drop any handle of the same
//! registry.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use pixelsnap_shared::{Quaternion, Transform, Vec3, WARMUP_NUDGE};

use crate::error::{SnapError, SnapResult};
use crate::observer::{ObserverList, SubscriptionId};
use crate::registry::{SharedRegistry, SlotHandle, SnapRegistry, WeakRegistry};

/// Where a handle is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleState {
    /// Registered, nothing queued yet.
    Registered,
    /// A move is queued for the next kernel pass.
    PendingMove,
    /// The transform holds the latest snapped position.
    Updated,
    /// Detached from the registry. Terminal.
    Unregistered,
}

impl HandleState {
    /// Checks if the handle still owns a slot.
    #[inline]
    #[must_use]
    pub const fn is_registered(self) -> bool {
        !matches!(self, Self::Unregistered)
    }
}

/// Payload of the per-entity "position updated" notification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionUpdate {
    /// Slot of the entity that moved.
    pub slot: SlotHandle,
    /// Unsnapped world position.
    pub real: Vec3,
    /// Pixel-aligned world position, now also in the entity's transform.
    pub snapped: Vec3,
}

#[derive(Debug)]
struct EntityState {
    transform: Transform,
    /// Registry values as of the last broadcast or re-anchor.
    real: Vec3,
    snapped: Vec3,
    state: HandleState,
}

/// Handle binding one game object to the shared registry.
///
/// Dropping the handle unregisters it.
pub struct TrackedEntity {
    slot: SlotHandle,
    registry: WeakRegistry,
    subscription: Option<SubscriptionId>,
    state: Arc<Mutex<EntityState>>,
    observers: Arc<RwLock<ObserverList<PositionUpdate>>>,
}

impl TrackedEntity {
    /// Registers a new entity at `initial.position`.
    ///
    /// Queues a tiny nudge along the transform's forward direction so the
    /// first kernel pass snaps the entity even if it never moves.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SnapError::CapacityExceeded`] if the registry is full.
    pub fn new(registry: &SharedRegistry, initial: Transform) -> SnapResult<Self> {
        let state = Arc::new(Mutex::new(EntityState {
            transform: initial,
            real: initial.position,
            snapped: Vec3::ZERO,
            state: HandleState::Registered,
        }));
        let observers = Arc::new(RwLock::new(ObserverList::new()));

        let mut guard = registry.write();
        let slot = guard.register(initial.position)?;

        guard.queue_move(slot, initial.forward() * WARMUP_NUDGE);
        state.lock().state = HandleState::PendingMove;

        let subscription = guard.subscribe(frame_updated_observer(
            slot,
            Arc::clone(&state),
            Arc::clone(&observers),
        ));
        drop(guard);

        tracing::debug!(%slot, "tracked entity registered");

        Ok(Self {
            slot,
            registry: registry.downgrade(),
            subscription: Some(subscription),
            state,
            observers,
        })
    }

    /// Slot this entity occupies.
    ///
    /// Only meaningful while [`TrackedEntity::state`] is registered.
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> SlotHandle {
        self.slot
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> HandleState {
        self.state.lock().state
    }

    /// Owner transform; its position is the last snapped position.
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.state.lock().transform
    }

    /// Replaces the rotation and scale of the owner transform.
    ///
    /// The position stays under registry control.
    pub fn set_orientation(&self, rotation: Quaternion, scale: f32) {
        let mut state = self.state.lock();
        state.transform.rotation = rotation;
        state.transform.scale = scale;
    }

    /// Queues `delta` for the next kernel pass.
    ///
    /// At most one move per frame: a second call before the pass replaces
    /// the first. No-op once unregistered or if the registry is gone.
    pub fn move_by(&self, delta: Vec3) {
        let Some(registry) = self.live_registry() else {
            return;
        };
        let mut guard = registry.write();
        guard.queue_move(self.slot, delta);
        self.state.lock().state = HandleState::PendingMove;
    }

    /// Re-anchors the entity at `position` and clears its accumulated delta.
    pub fn reset_anchor(&self, position: Vec3) {
        if let Some(registry) = self.live_registry() {
            let mut guard = registry.write();
            guard.reset_anchor(self.slot, position);
            self.state.lock().real = position;
        }
    }

    /// Unsnapped world position, or zero once detached.
    ///
    /// Never locks the registry, so it is safe inside observers.
    #[must_use]
    pub fn real_position(&self) -> Vec3 {
        let state = self.state.lock();
        if self.is_attached(state.state) {
            state.real
        } else {
            Vec3::ZERO
        }
    }

    /// Snapped world position, or zero once detached.
    ///
    /// Zero until the first kernel pass, like the registry entry.
    #[must_use]
    pub fn snapped_position(&self) -> Vec3 {
        let state = self.state.lock();
        if self.is_attached(state.state) {
            state.snapped
        } else {
            Vec3::ZERO
        }
    }

    /// Registry this entity is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::RegistryUnavailable`] once the registry has been
    /// dropped.
    pub fn registry(&self) -> SnapResult<SharedRegistry> {
        self.registry.upgrade().ok_or(SnapError::RegistryUnavailable)
    }

    /// Subscribes to this entity's "position updated" notification.
    ///
    /// Fires after a kernel pass that consumed this entity's queued move,
    /// unless its real and snapped positions both came out unchanged. Idle
    /// frames are silent.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&PositionUpdate) + Send + Sync + 'static,
    {
        self.observers.write().subscribe(observer)
    }

    /// Removes an entity observer.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.write().unsubscribe(id)
    }

    /// Detaches from the broadcast and frees the slot.
    ///
    /// Idempotent. If the registry is already gone only the local state
    /// changes.
    pub fn teardown(&mut self) {
        let mut state = self.state.lock();
        if !state.state.is_registered() {
            return;
        }
        state.state = HandleState::Unregistered;
        drop(state);

        if let Some(registry) = self.registry.upgrade() {
            let mut guard = registry.write();
            if let Some(id) = self.subscription.take() {
                guard.unsubscribe(id);
            }
            guard.unregister(self.slot);
        }
        self.subscription = None;

        tracing::debug!(slot = %self.slot, "tracked entity unregistered");
    }

    fn is_attached(&self, state: HandleState) -> bool {
        state.is_registered() && !self.registry.is_dangling()
    }

    fn live_registry(&self) -> Option<SharedRegistry> {
        if !self.state().is_registered() {
            return None;
        }
        self.registry.upgrade()
    }
}

impl Drop for TrackedEntity {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for TrackedEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedEntity")
            .field("slot", &self.slot)
            .field("state", &self.state())
            .field("observers", &self.observers.read().len())
            .finish_non_exhaustive()
    }
}

/// Builds the registry-broadcast callback for one entity.
fn frame_updated_observer(
    slot: SlotHandle,
    state: Arc<Mutex<EntityState>>,
    observers: Arc<RwLock<ObserverList<PositionUpdate>>>,
) -> impl Fn(&SnapRegistry) + Send + Sync + 'static {
    move |registry: &SnapRegistry| {
        let mut guard = state.lock();
        // Idle this frame: no queued move was consumed.
        if guard.state != HandleState::PendingMove {
            return;
        }
        let Some(entry) = registry.entry(slot) else {
            return;
        };
        let update = PositionUpdate {
            slot,
            real: entry.real_position(),
            snapped: entry.snapped_position,
        };

        let changed = update.real != guard.real || update.snapped != guard.snapped;
        guard.real = update.real;
        guard.snapped = update.snapped;
        guard.transform.position = update.snapped;
        guard.state = HandleState::Updated;
        drop(guard);

        if changed {
            observers.read().notify(&update);
        }
    }
}

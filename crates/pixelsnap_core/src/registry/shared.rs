//! Shared ownership of the registry.
//!
//! The registry is created once at startup and handed to every tracked
//! entity. Handles keep a [`WeakRegistry`] so a registry torn down first
//! turns their operations into no-ops instead of keeping it alive.

use std::sync::{Arc, Weak};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{FrameReport, SnapRegistry};
use crate::camera::CameraFrame;
use crate::error::SnapResult;

/// Cloneable, thread-safe handle to a [`SnapRegistry`].
///
/// # Locking
///
/// `run_frame_update` holds the write lock for the kernel pass and the
/// broadcast. Broadcast observers must read through the `&SnapRegistry`
/// they receive and never lock this handle again. `TrackedEntity` position
/// reads do not lock it and are safe there.
#[derive(Clone, Debug)]
pub struct SharedRegistry {
    inner: Arc<RwLock<SnapRegistry>>,
}

impl SharedRegistry {
    /// Wraps a registry for sharing.
    #[must_use]
    pub fn new(registry: SnapRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Acquires shared read access.
    pub fn read(&self) -> RwLockReadGuard<'_, SnapRegistry> {
        self.inner.read()
    }

    /// Acquires exclusive write access.
    pub fn write(&self) -> RwLockWriteGuard<'_, SnapRegistry> {
        self.inner.write()
    }

    /// Creates a non-owning reference.
    #[must_use]
    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Runs the kernel and the broadcast under one write lock.
    pub fn run_frame_update(&self, camera: &CameraFrame) -> FrameReport {
        self.inner.write().run_frame_update(camera)
    }

    /// See [`SnapRegistry::try_run_frame_update`].
    ///
    /// # Errors
    ///
    /// Propagates [`crate::SnapError::MissingCameraFrame`].
    pub fn try_run_frame_update(&self, camera: Option<&CameraFrame>) -> SnapResult<FrameReport> {
        self.inner.write().try_run_frame_update(camera)
    }

    /// Checks if two handles share the same registry.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Non-owning counterpart of [`SharedRegistry`].
#[derive(Clone, Debug, Default)]
pub struct WeakRegistry {
    inner: Weak<RwLock<SnapRegistry>>,
}

impl WeakRegistry {
    /// Upgrades to a strong handle if the registry still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<SharedRegistry> {
        self.inner.upgrade().map(|inner| SharedRegistry { inner })
    }

    /// Checks if the registry has been dropped.
    #[must_use]
    pub fn is_dangling(&self) -> bool {
        self.inner.strong_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelsnap_shared::Vec3;

    #[test]
    fn test_clones_share_state() {
        let shared = SharedRegistry::new(SnapRegistry::new(4));
        let other = shared.clone();

        let h = shared.write().register(Vec3::X).unwrap();
        assert_eq!(other.read().real_position(h), Vec3::X);
        assert!(shared.ptr_eq(&other));
    }

    #[test]
    fn test_weak_does_not_keep_registry_alive() {
        let shared = SharedRegistry::new(SnapRegistry::new(1));
        let weak = shared.downgrade();
        assert!(weak.upgrade().is_some());

        drop(shared);
        assert!(weak.upgrade().is_none());
        assert!(weak.is_dangling());
        assert!(WeakRegistry::default().is_dangling());
    }
}

//! # Registry Scenario Tests
//!
//! End-to-end checks of the registry through its public API:
//!
//! 1. **Capacity**: boundary, failure reporting and lowest-index reuse
//! 2. **Round trip**: snapped positions stay within half a pixel
//! 3. **Accumulation**: split moves land where a single move lands
//! 4. **Handles**: lifecycle and per-entity notifications
//!
//! Run with: cargo test -p pixelsnap_core --test registry_scenario

#![allow(missing_docs)]

use std::sync::{mpsc, Arc};
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pixelsnap_core::{
    CameraFrame, HandleState, ScreenSize, SharedRegistry, SlotHandle, SnapError, SnapRegistry,
    TrackedEntity,
};
use pixelsnap_shared::{Mat4, Transform, Vec3};

/// Orthographic camera at z = 10 looking down -z; one pixel is 1/16 unit.
fn ortho_camera() -> CameraFrame {
    let view = Mat4::look_to_rh(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z, Vec3::Y);
    CameraFrame::orthographic(view, 6.75, ScreenSize::new(384, 216), 0.1, 100.0).unwrap()
}

/// Tilted perspective camera looking at the origin from above and behind.
fn perspective_camera() -> CameraFrame {
    let view = Mat4::look_to_rh(Vec3::new(0.0, 6.0, 12.0), Vec3::new(0.0, -0.45, -1.0), Vec3::Y);
    let projection = Mat4::perspective_rh_gl(0.9, 384.0 / 216.0, 0.3, 500.0);
    CameraFrame::new(view, projection, ScreenSize::new(384, 216)).unwrap()
}

/// 64x64 orthographic camera with one pixel per world unit; `x` lands on
/// pixel `x + 32` with no rounding error.
fn unit_pixel_camera() -> CameraFrame {
    let view = Mat4::look_to_rh(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z, Vec3::Y);
    CameraFrame::orthographic(view, 32.0, ScreenSize::new(64, 64), 0.1, 100.0).unwrap()
}

fn assert_within_half_pixel(camera: &CameraFrame, real: Vec3, snapped: Vec3) {
    let r = camera.world_to_screen(real).unwrap();
    let s = camera.world_to_screen(snapped).unwrap();
    let tolerance = 0.5 + 1e-2;
    assert!((r.x - s.x).abs() <= tolerance, "x off by {} px", (r.x - s.x).abs());
    assert!((r.y - s.y).abs() <= tolerance, "y off by {} px", (r.y - s.y).abs());
}

// ============================================================================
// CAPACITY
// ============================================================================

#[test]
fn test_capacity_two_scenario() {
    let camera = ortho_camera();
    let mut registry = SnapRegistry::new(2);

    let a = registry.register(Vec3::ZERO).unwrap();
    let b = registry.register(Vec3::new(3.0, 0.0, 0.0)).unwrap();
    assert_eq!(a.index(), 0);
    assert_eq!(b.index(), 1);

    assert_eq!(
        registry.register(Vec3::ZERO),
        Err(SnapError::CapacityExceeded { capacity: 2 })
    );

    assert!(registry.unregister(a));
    let d = registry.register(Vec3::new(1.0, 1.0, 1.0)).unwrap();
    assert_eq!(d.index(), 0);

    registry.queue_move(d, Vec3::new(1.0, 0.0, 0.0));
    let report = registry.run_frame_update(&camera);

    assert_eq!(report.updated, 1);
    assert_eq!(report.idle, 1);
    assert_eq!(report.live, 2);
    assert_eq!(registry.real_position(d), Vec3::new(2.0, 1.0, 1.0));

    let expected = camera.snap(Vec3::new(2.0, 1.0, 1.0)).unwrap();
    assert!(registry.snapped_position(d).distance(expected) < 1e-5);
    // (2, 1) sits exactly on the grid at 16 px per unit.
    assert!(registry.snapped_position(d).distance(Vec3::new(2.0, 1.0, 1.0)) < 1e-4);
}

#[test]
fn test_failed_registration_leaves_state_untouched() {
    let mut registry = SnapRegistry::new(1);
    let a = registry.register(Vec3::X).unwrap();
    registry.queue_move(a, Vec3::Y);

    assert!(registry.register(Vec3::Z).is_err());

    assert_eq!(registry.live_count(), 1);
    assert_eq!(registry.entry(a).unwrap().pending_delta, Vec3::Y);
}

#[test]
fn test_zero_capacity_registry() {
    let mut registry = SnapRegistry::new(0);
    assert_eq!(
        registry.register(Vec3::ZERO),
        Err(SnapError::CapacityExceeded { capacity: 0 })
    );
    let report = registry.run_frame_update(&ortho_camera());
    assert_eq!(report.live, 0);
}

#[test]
fn test_sentinel_handle_is_inert() {
    let mut registry = SnapRegistry::new(2);
    let live = registry.register(Vec3::ZERO).unwrap();
    let sentinel = SlotHandle::from_raw(-1);

    registry.queue_move(sentinel, Vec3::X);
    registry.reset_anchor(sentinel, Vec3::X);
    assert!(!registry.unregister(sentinel));
    assert_eq!(registry.real_position(sentinel), Vec3::ZERO);
    assert_eq!(registry.snapped_position(sentinel), Vec3::ZERO);

    let report = registry.run_frame_update(&ortho_camera());
    assert_eq!(report.updated, 0);
    assert!(registry.is_live(live));
}

// ============================================================================
// ROUND TRIP
// ============================================================================

#[test]
fn test_round_trip_within_half_pixel() {
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for camera in [ortho_camera(), perspective_camera()] {
        let mut registry = SnapRegistry::new(256);
        let handles: Vec<_> = (0..256)
            .map(|_| {
                let p = Vec3::new(
                    rng.gen_range(-8.0..8.0),
                    rng.gen_range(-4.0..4.0),
                    rng.gen_range(-3.0..3.0),
                );
                registry.register(p).unwrap()
            })
            .collect();

        for _ in 0..10 {
            for &h in &handles {
                let delta = Vec3::new(
                    rng.gen_range(-0.2..0.2),
                    rng.gen_range(-0.2..0.2),
                    rng.gen_range(-0.05..0.05),
                );
                registry.queue_move(h, delta);
            }
            let report = registry.run_frame_update(&camera);
            assert_eq!(report.failed, 0);

            for &h in &handles {
                assert_within_half_pixel(&camera, registry.real_position(h), registry.snapped_position(h));
            }
        }
    }
}

#[test]
fn test_ortho_snap_within_half_pixel_world_units() {
    let camera = ortho_camera();
    let mut rng = StdRng::seed_from_u64(42);
    let mut registry = SnapRegistry::new(64);

    for _ in 0..64 {
        let h = registry
            .register(Vec3::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0), 0.0))
            .unwrap();
        registry.queue_move(h, Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), 0.0));
    }
    registry.run_frame_update(&camera);

    for index in 0..64 {
        let h = SlotHandle::from_index(index);
        let real = registry.real_position(h);
        let snapped = registry.snapped_position(h);
        let half = camera.half_pixel_world_size(real).unwrap();
        assert!((real.x - snapped.x).abs() <= half + 1e-4);
        assert!((real.y - snapped.y).abs() <= half + 1e-4);
        assert!((real.z - snapped.z).abs() < 1e-4);
    }
}

#[test]
fn test_kernel_rounds_pixel_ties_to_even() {
    let camera = unit_pixel_camera();
    let mut registry = SnapRegistry::new(4);

    // Pixel 32.5 rounds down to 32, pixel 33.5 rounds up to 34.
    let down = registry.register(Vec3::ZERO).unwrap();
    let up = registry.register(Vec3::ZERO).unwrap();
    registry.queue_move(down, Vec3::new(0.5, 0.0, 0.0));
    registry.queue_move(up, Vec3::new(1.5, 0.0, 0.0));

    let report = registry.run_frame_update(&camera);
    assert_eq!(report.updated, 2);

    let screen = camera.world_to_screen(registry.real_position(down)).unwrap();
    assert_eq!(screen.x, 32.5);
    assert!(registry.snapped_position(down).x.abs() < 1e-4);
    assert!((registry.snapped_position(up).x - 2.0).abs() < 1e-4);
}

// ============================================================================
// ACCUMULATION
// ============================================================================

#[test]
fn test_split_moves_match_single_move() {
    let camera = ortho_camera();
    let mut split = SnapRegistry::new(1);
    let mut whole = SnapRegistry::new(1);
    let start = Vec3::new(0.7, -1.3, 0.2);
    let d1 = Vec3::new(0.33, 0.11, 0.0);
    let d2 = Vec3::new(-0.05, 0.47, 0.01);

    let a = split.register(start).unwrap();
    split.queue_move(a, d1);
    split.run_frame_update(&camera);
    split.queue_move(a, d2);
    split.run_frame_update(&camera);

    let b = whole.register(start).unwrap();
    whole.queue_move(b, d1 + d2);
    whole.run_frame_update(&camera);

    assert!(split.real_position(a).distance(whole.real_position(b)) < 1e-6);
    assert!(split.snapped_position(a).distance(whole.snapped_position(b)) < 1e-5);
}

#[test]
fn test_reset_anchor_then_move() {
    let camera = ortho_camera();
    let mut registry = SnapRegistry::new(1);
    let h = registry.register(Vec3::ZERO).unwrap();
    registry.queue_move(h, Vec3::new(5.0, 0.0, 0.0));
    registry.run_frame_update(&camera);

    registry.reset_anchor(h, Vec3::new(-1.0, 0.0, 0.0));
    registry.queue_move(h, Vec3::new(0.0, 0.5, 0.0));
    registry.run_frame_update(&camera);

    assert!(registry.real_position(h).distance(Vec3::new(-1.0, 0.5, 0.0)) < 1e-6);
    assert!(registry.snapped_position(h).distance(Vec3::new(-1.0, 0.5, 0.0)) < 1e-4);
}

// ============================================================================
// HANDLES
// ============================================================================

#[test]
fn test_entity_observer_reads_positions_during_broadcast() {
    let registry = SharedRegistry::new(SnapRegistry::new(2));
    let entity = Arc::new(TrackedEntity::new(&registry, Transform::IDENTITY).unwrap());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let weak = Arc::downgrade(&entity);
    entity.subscribe(move |update| {
        if let Some(entity) = weak.upgrade() {
            sink.lock().push((*update, entity.real_position(), entity.snapped_position()));
        }
    });
    entity.move_by(Vec3::new(0.3, 0.0, 0.0));

    let (tx, rx) = mpsc::channel();
    let worker = registry.clone();
    std::thread::spawn(move || {
        let report = worker.run_frame_update(&ortho_camera());
        let _ = tx.send(report.updated);
    });
    let updated = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("frame update did not finish");
    assert_eq!(updated, 1);

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    let (update, real, snapped) = seen[0];
    assert_eq!(real, update.real);
    assert_eq!(snapped, update.snapped);
    // 0.3 units is 4.8 px: snapped to 5 px.
    assert!((snapped.x - 0.3125).abs() < 1e-4);
}

#[test]
fn test_entities_follow_snapped_positions() {
    let camera = ortho_camera();
    let registry = SharedRegistry::new(SnapRegistry::new(8));

    let entities: Vec<_> = (0..4)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f32;
            TrackedEntity::new(&registry, Transform::from_position(Vec3::new(x, 0.0, 0.0))).unwrap()
        })
        .collect();

    let notifications = Arc::new(Mutex::new(0usize));
    for entity in &entities {
        let counter = Arc::clone(&notifications);
        entity.subscribe(move |_| *counter.lock() += 1);
    }

    for frame in 0..30 {
        for entity in &entities {
            #[allow(clippy::cast_precision_loss)]
            let t = frame as f32 * 0.1;
            entity.move_by(Vec3::new(t.sin().signum() * 0.07, 0.013, 0.0));
        }
        registry.run_frame_update(&camera);

        for entity in &entities {
            assert_eq!(entity.state(), HandleState::Updated);
            assert_eq!(entity.transform().position, entity.snapped_position());
            assert_within_half_pixel(&camera, entity.real_position(), entity.transform().position);
        }
    }

    assert_eq!(*notifications.lock(), 4 * 30);
}

#[test]
fn test_dropped_entity_slot_is_reused() {
    let registry = SharedRegistry::new(SnapRegistry::new(2));
    let first = TrackedEntity::new(&registry, Transform::IDENTITY).unwrap();
    let second = TrackedEntity::new(&registry, Transform::IDENTITY).unwrap();
    assert!(TrackedEntity::new(&registry, Transform::IDENTITY).is_err());

    let freed = first.slot();
    drop(first);

    let third = TrackedEntity::new(&registry, Transform::IDENTITY).unwrap();
    assert_eq!(third.slot(), freed);
    assert_ne!(third.slot(), second.slot());
    assert_eq!(registry.read().observer_count(), 2);
}

#[test]
fn test_missing_camera_through_shared_registry() {
    let registry = SharedRegistry::new(SnapRegistry::new(1));
    let entity = TrackedEntity::new(&registry, Transform::IDENTITY).unwrap();
    entity.move_by(Vec3::new(0.5, 0.0, 0.0));

    assert!(matches!(
        registry.try_run_frame_update(None),
        Err(SnapError::MissingCameraFrame { .. })
    ));
    assert_eq!(entity.state(), HandleState::PendingMove);

    registry.try_run_frame_update(Some(&ortho_camera())).unwrap();
    assert_eq!(entity.state(), HandleState::Updated);
    assert!((entity.transform().position.x - 0.5).abs() < 1e-4);
}

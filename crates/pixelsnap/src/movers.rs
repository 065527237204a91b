//! Movement producers for demos and soak tests.

use pixelsnap_core::TrackedEntity;
use pixelsnap_shared::Vec3;

/// Swings back and forth along X.
///
/// Moves at full `speed` in the direction of `sin(elapsed)`, so it reverses
/// every π seconds and stands still only when the sine is exactly zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Oscillator {
    /// World units per second.
    pub speed: f32,
    elapsed: f32,
}

impl Oscillator {
    /// Creates an oscillator at phase zero.
    #[must_use]
    pub const fn new(speed: f32) -> Self {
        Self { speed, elapsed: 0.0 }
    }

    /// Creates an oscillator starting `phase` seconds in.
    #[must_use]
    pub const fn with_phase(speed: f32, phase: f32) -> Self {
        Self { speed, elapsed: phase }
    }

    /// Seconds since phase zero.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advances by `delta_time` and returns this frame's displacement.
    pub fn step(&mut self, delta_time: f32) -> Vec3 {
        self.elapsed += delta_time;
        let wave = self.elapsed.sin();
        let sign = if wave == 0.0 { 0.0 } else { wave.signum() };
        Vec3::new(sign * self.speed * delta_time, 0.0, 0.0)
    }

    /// Steps and queues the displacement on `entity`.
    pub fn drive(&mut self, entity: &TrackedEntity, delta_time: f32) {
        entity.move_by(self.step(delta_time));
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(10.0)
    }
}

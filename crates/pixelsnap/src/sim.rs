//! # Headless Simulation
//!
//! Wires the frame driver, a follow camera, a followed target and a crowd
//! of oscillating movers together and runs them at a fixed step. Used by
//! the `pixelsnap_sim` binary and as a soak test.
//!
//! ```toml
//! frames = 600
//! movers = 500
//! delta_time = 0.016666
//! seed = 7
//! rotate_every = 120
//!
//! [snap]
//! capacity = 1024
//!
//! [rig]
//! pitch_degrees = 30.0
//!
//! [resolution]
//! window = { width = 1920, height = 1080 }
//! ```

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use pixelsnap_core::{SnapConfig, SnapError, SnapResult, TrackedEntity};
use pixelsnap_shared::{Transform, Vec3};

use crate::camera::{CameraRig, CameraRigConfig, ResolutionSettings, RotateDirection};
use crate::frame_driver::{FrameDriver, FrameStatsAccumulator};
use crate::movers::Oscillator;

/// Everything a simulation run needs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Frames to run.
    pub frames: u32,
    /// Oscillating entities besides the followed target.
    pub movers: usize,
    /// Fixed step in seconds.
    pub delta_time: f32,
    /// Seed for mover placement.
    pub seed: u64,
    /// Request a camera turn every this many frames; `0` never turns.
    pub rotate_every: u32,
    /// Registry settings.
    pub snap: SnapConfig,
    /// Camera tuning.
    pub rig: CameraRigConfig,
    /// Window resolution and pixel density. `target` must match
    /// `snap.resolution`.
    pub resolution: ResolutionSettings,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            movers: 256,
            delta_time: 1.0 / 60.0,
            seed: 7,
            rotate_every: 120,
            snap: SnapConfig::default(),
            rig: CameraRigConfig::default(),
            resolution: ResolutionSettings::default(),
        }
    }
}

impl SimConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidConfig`] on malformed TOML or bad values.
    pub fn from_toml_str(source: &str) -> SnapResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| SnapError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidConfig`] if the file cannot be read or
    /// does not parse.
    pub fn load(path: impl AsRef<Path>) -> SnapResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| SnapError::InvalidConfig(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), "loaded simulation config");
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidConfig`] for the first bad value. The
    /// registry must also hold the movers, the target and the camera.
    pub fn validate(&self) -> SnapResult<()> {
        self.snap.validate()?;
        self.rig.validate()?;
        self.resolution.validate()?;
        if !(self.delta_time.is_finite() && self.delta_time > 0.0) {
            return Err(SnapError::InvalidConfig("delta_time must be positive".into()));
        }
        if self.resolution.target != self.snap.resolution {
            return Err(SnapError::InvalidConfig(format!(
                "resolution.target {}x{} differs from snap.resolution {}x{}",
                self.resolution.target.width,
                self.resolution.target.height,
                self.snap.resolution.width,
                self.snap.resolution.height
            )));
        }
        if self.movers + 2 > self.snap.capacity {
            return Err(SnapError::InvalidConfig(format!(
                "capacity {} cannot hold {} movers plus target and camera",
                self.snap.capacity, self.movers
            )));
        }
        Ok(())
    }
}

/// A running simulation.
pub struct Simulation {
    config: SimConfig,
    // Declared before the driver so handles drop while the registry lives.
    rig: CameraRig,
    target: TrackedEntity,
    target_motion: Oscillator,
    movers: Vec<(TrackedEntity, Oscillator)>,
    driver: FrameDriver,
}

impl Simulation {
    /// Builds the scene.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidConfig`] for a bad config and
    /// [`SnapError::CapacityExceeded`] if registration fails.
    pub fn new(config: SimConfig) -> SnapResult<Self> {
        config.validate()?;
        let driver = FrameDriver::new(&config.snap)?;
        let registry = driver.registry().clone();

        let target = TrackedEntity::new(&registry, Transform::IDENTITY)?;

        // Camera sits back along +Z, high enough to look down at the origin.
        let pitch = config.rig.pitch_degrees.to_radians();
        let distance = 20.0;
        let eye = Vec3::new(0.0, distance * pitch.sin(), distance * pitch.cos());
        let rig = CameraRig::new(&registry, eye, 0.0, config.rig, &config.resolution)?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let movers = (0..config.movers)
            .map(|_| {
                let start = Vec3::new(rng.gen_range(-12.0..12.0), 0.0, rng.gen_range(-12.0..12.0));
                let entity = TrackedEntity::new(&registry, Transform::from_position(start))?;
                let motion = Oscillator::with_phase(rng.gen_range(1.0..6.0), rng.gen_range(0.0..6.0));
                Ok::<_, SnapError>((entity, motion))
            })
            .collect::<SnapResult<Vec<_>>>()?;

        tracing::info!(movers = movers.len(), frames = config.frames, "simulation ready");

        Ok(Self {
            config,
            rig,
            target,
            target_motion: Oscillator::new(4.0),
            movers,
            driver,
        })
    }

    /// Frame driver, for stats and registry access.
    #[must_use]
    pub const fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    /// The follow camera.
    #[must_use]
    pub const fn rig(&self) -> &CameraRig {
        &self.rig
    }

    /// The entity the camera follows.
    #[must_use]
    pub const fn target(&self) -> &TrackedEntity {
        &self.target
    }

    /// Forwards to [`FrameDriver::set_timing_logs`].
    pub fn set_timing_logs(&mut self, enabled: bool) {
        self.driver.set_timing_logs(enabled);
    }

    /// Runs one frame.
    ///
    /// # Errors
    ///
    /// Propagates camera and driver errors.
    pub fn step(&mut self) -> SnapResult<()> {
        let ctx = self.driver.begin_frame_with_delta(self.config.delta_time);

        if self.config.rotate_every > 0 && ctx.frame > 0 && ctx.frame % u64::from(self.config.rotate_every) == 0 {
            let direction = if (ctx.frame / u64::from(self.config.rotate_every)) % 2 == 0 {
                RotateDirection::Right
            } else {
                RotateDirection::Left
            };
            self.rig.request_rotation(direction);
        }

        let camera = self.rig.camera_frame(self.driver.screen())?;

        self.target_motion.drive(&self.target, ctx.delta_time);
        for (entity, motion) in &mut self.movers {
            motion.drive(entity, ctx.delta_time);
        }
        self.rig.update(&camera, self.target.real_position(), ctx.delta_time);

        self.driver.submit_camera(camera);
        self.driver.end_frame()?;
        Ok(())
    }

    /// Runs every configured frame and returns the statistics.
    ///
    /// # Errors
    ///
    /// Stops at the first failing frame.
    pub fn run(&mut self) -> SnapResult<&FrameStatsAccumulator> {
        for _ in 0..self.config.frames {
            self.step()?;
        }
        Ok(self.driver.stats())
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("movers", &self.movers.len())
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

//! # PIXELSNAP Frame Driver
//!
//! THE FRAME ORCHESTRATION:
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. BEGIN FRAME                                                      │
//! │    └─ Clamp delta time, clear last frame's camera                   │
//! │                                                                     │
//! │ 2. PRODUCERS                                                        │
//! │    ├─ Movers call TrackedEntity::move_by (once per handle)          │
//! │    └─ Camera rig queues its own move                                │
//! │                                                                     │
//! │ 3. SUBMIT CAMERA                                                    │
//! │    └─ Fresh CameraFrame for this tick                               │
//! │                                                                     │
//! │ 4. END FRAME                                                        │
//! │    ├─ Kernel pass over every live slot                              │
//! │    ├─ "Positions updated" broadcast                                 │
//! │    └─ Record timing                                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::{Duration, Instant};

use pixelsnap_core::{
    CameraFrame, FrameReport, ScreenSize, SharedRegistry, SnapConfig, SnapRegistry, SnapResult,
};

/// Target frame time for 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// Maximum allowed frame time before warning.
pub const MAX_FRAME_TIME: Duration = Duration::from_millis(33);

/// Delta time ceiling; longer pauses are treated as one slow frame.
pub const MAX_DELTA_TIME: f32 = 0.1;

/// Timing and kernel results for one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Time from `begin_frame` to the end of the broadcast, in microseconds.
    pub total_us: u64,
    /// Kernel pass plus broadcast, in microseconds.
    pub snap_us: u64,
    /// What the kernel did.
    pub report: FrameReport,
}

/// Per-frame values handed to producers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    /// Current frame number.
    pub frame: u64,
    /// Seconds since the previous frame, clamped to [`MAX_DELTA_TIME`].
    pub delta_time: f32,
}

/// Drives the snap registry once per frame.
///
/// Owns the shared registry, the frame counter and the camera slot.
pub struct FrameDriver {
    /// The registry every tracked entity binds to.
    registry: SharedRegistry,
    /// Render-target resolution camera frames are built for.
    screen: ScreenSize,
    /// Frame counter.
    frame_count: u64,
    /// Last frame start time.
    last_frame_time: Instant,
    /// Camera submitted for the current frame.
    camera: Option<CameraFrame>,
    /// Log frames slower than [`MAX_FRAME_TIME`].
    enable_timing_logs: bool,
    /// Accumulated frame statistics.
    stats_accumulator: FrameStatsAccumulator,
}

impl FrameDriver {
    /// Creates a driver with a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns [`pixelsnap_core::SnapError::InvalidConfig`] if `config` fails
    /// validation.
    pub fn new(config: &SnapConfig) -> SnapResult<Self> {
        config.validate()?;
        tracing::info!(
            capacity = config.capacity,
            parallel_threshold = config.parallel_threshold,
            "frame driver ready"
        );
        Ok(Self::with_registry(
            SharedRegistry::new(SnapRegistry::from_config(config)),
            config.resolution,
        ))
    }

    /// Creates a driver around an existing registry rendering at `screen`.
    #[must_use]
    pub fn with_registry(registry: SharedRegistry, screen: ScreenSize) -> Self {
        Self {
            registry,
            screen,
            frame_count: 0,
            last_frame_time: Instant::now(),
            camera: None,
            enable_timing_logs: false,
            stats_accumulator: FrameStatsAccumulator::new(),
        }
    }

    /// Enables slow-frame warnings.
    pub fn set_timing_logs(&mut self, enabled: bool) {
        self.enable_timing_logs = enabled;
    }

    /// Begins a new frame, measuring delta time from the wall clock.
    #[must_use]
    pub fn begin_frame(&mut self) -> FrameContext {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time);
        self.begin_frame_at(now, delta.as_secs_f32())
    }

    /// Begins a new frame with a caller-supplied delta time.
    ///
    /// For fixed-step and headless drivers.
    #[must_use]
    pub fn begin_frame_with_delta(&mut self, delta_time: f32) -> FrameContext {
        self.begin_frame_at(Instant::now(), delta_time)
    }

    fn begin_frame_at(&mut self, now: Instant, delta_time: f32) -> FrameContext {
        self.last_frame_time = now;
        self.camera = None;

        // Clamp delta time so a long pause does not teleport everything
        let delta_time = if delta_time.is_finite() {
            delta_time.clamp(0.0, MAX_DELTA_TIME)
        } else {
            0.0
        };

        FrameContext {
            frame: self.frame_count,
            delta_time,
        }
    }

    /// Supplies the camera for the current frame. The last submission wins.
    ///
    /// A camera built for another resolution is still used, with a warning.
    pub fn submit_camera(&mut self, camera: CameraFrame) {
        if camera.screen() != self.screen {
            tracing::warn!(
                expected = %format_args!("{}x{}", self.screen.width, self.screen.height),
                got = %format_args!("{}x{}", camera.screen().width, camera.screen().height),
                "camera frame resolution differs from the configured render target"
            );
        }
        self.camera = Some(camera);
    }

    /// Runs the kernel and the broadcast, then closes the frame.
    ///
    /// # Errors
    ///
    /// Returns [`pixelsnap_core::SnapError::MissingCameraFrame`] if no camera
    /// was submitted. Queued moves are kept for the next frame and the frame
    /// counter still advances.
    pub fn end_frame(&mut self) -> SnapResult<FrameStats> {
        let frame = self.frame_count;
        self.frame_count += 1;

        let camera = self.camera.take();
        let snap_start = Instant::now();
        let result = self.registry.try_run_frame_update(camera.as_ref());
        let snap_us = elapsed_us(snap_start);

        let report = match result {
            Ok(report) => report,
            Err(err) => {
                self.stats_accumulator.frames_missing_camera += 1;
                return Err(err);
            }
        };

        let stats = FrameStats {
            frame,
            total_us: elapsed_us(self.last_frame_time),
            snap_us,
            report,
        };
        self.stats_accumulator.record(&stats);

        // Log slow frames
        if self.enable_timing_logs && stats.total_us > duration_us(MAX_FRAME_TIME) {
            tracing::warn!(
                frame,
                total_ms = stats.total_us as f64 / 1000.0,
                target_ms = duration_us(TARGET_FRAME_TIME) as f64 / 1000.0,
                "frame exceeded budget"
            );
        }

        Ok(stats)
    }

    /// Returns the shared registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Render-target resolution from the snap config.
    #[inline]
    #[must_use]
    pub const fn screen(&self) -> ScreenSize {
        self.screen
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }
}

impl std::fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDriver")
            .field("frame_count", &self.frame_count)
            .field("has_camera", &self.camera.is_some())
            .field("stats", &self.stats_accumulator)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn duration_us(duration: Duration) -> u64 {
    duration.as_micros() as u64
}

fn elapsed_us(since: Instant) -> u64 {
    duration_us(since.elapsed())
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Frames skipped because no camera was submitted.
    pub frames_missing_camera: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of kernel-plus-broadcast times.
    pub snap_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
    /// Entries re-snapped across all frames.
    pub entries_updated: u64,
    /// Entries whose projection failed across all frames.
    pub entries_failed: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            frames_missing_camera: 0,
            total_us_sum: 0,
            snap_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            entries_updated: 0,
            entries_failed: 0,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: &FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.snap_us_sum += stats.snap_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.entries_updated += stats.report.updated as u64;
        self.entries_failed += stats.report.failed as u64;

        if stats.total_us > duration_us(TARGET_FRAME_TIME) {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average kernel-plus-broadcast time in milliseconds.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn avg_snap_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.snap_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the fraction of frames over budget.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a summary of the statistics.
    #[allow(clippy::cast_precision_loss)]
    pub fn log_summary(&self) {
        let min_ms = if self.frames_recorded == 0 {
            0.0
        } else {
            self.min_frame_us as f64 / 1000.0
        };
        tracing::info!(
            frames = self.frames_recorded,
            missing_camera = self.frames_missing_camera,
            avg_frame_ms = self.avg_frame_ms(),
            avg_snap_ms = self.avg_snap_ms(),
            min_frame_ms = min_ms,
            max_frame_ms = self.max_frame_us as f64 / 1000.0,
            over_budget_pct = self.over_budget_ratio() * 100.0,
            updated = self.entries_updated,
            failed = self.entries_failed,
            "frame statistics"
        );
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

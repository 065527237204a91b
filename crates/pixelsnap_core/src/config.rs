//! # Snap Configuration
//!
//! TOML-loadable registry settings. Every field has a default, so an empty
//! file is a valid configuration.
//!
//! ```toml
//! capacity = 2048
//! parallel_threshold = 4096
//!
//! [resolution]
//! width = 384
//! height = 216
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use pixelsnap_shared::{DEFAULT_CAPACITY, DEFAULT_PARALLEL_THRESHOLD};

use crate::camera::ScreenSize;
use crate::error::{SnapError, SnapResult};

/// Registry and render-target settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapConfig {
    /// Maximum simultaneously tracked entities.
    pub capacity: usize,
    /// Target pixel resolution of the low-resolution render.
    pub resolution: ScreenSize,
    /// Live-entry count at which the kernel fans out across threads.
    pub parallel_threshold: usize,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            resolution: ScreenSize::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl SnapConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidConfig`] on malformed TOML, unknown keys,
    /// or values rejected by [`SnapConfig::validate`].
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
        tracing::info!(path = %path.display(), capacity = config.capacity, "loaded snap config");
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidConfig`] for a zero capacity, a zero-sized
    /// resolution, or a capacity that does not fit a slot handle.
    pub fn validate(&self) -> SnapResult<()> {
        if self.capacity == 0 {
            return Err(SnapError::InvalidConfig("capacity must be greater than zero".into()));
        }
        if u32::try_from(self.capacity).map_or(true, |c| c == u32::MAX) {
            return Err(SnapError::InvalidConfig(format!(
                "capacity {} exceeds the slot handle range",
                self.capacity
            )));
        }
        if self.resolution.is_empty() {
            return Err(SnapError::InvalidConfig(format!(
                "resolution {}x{} must be non-zero",
                self.resolution.width, self.resolution.height
            )));
        }
        Ok(())
    }
}

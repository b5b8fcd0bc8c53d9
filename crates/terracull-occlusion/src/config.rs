//! Occluder configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for occluder behavior and debug output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OccluderConfig {
    /// Faces closer than this many blocks to the camera count as near occluders.
    pub near_range: i32,
    /// Log redraw causes and distance progression of occlusion passes.
    pub trace_outcomes: bool,
    /// Directory receiving raster debug images.
    pub raster_output_dir: PathBuf,
    /// File name of the periodic raster debug image.
    pub raster_file_name: String,
    /// Minimum time between unforced raster debug images.
    pub raster_output_interval: Duration,
}

impl Default for OccluderConfig {
    fn default() -> Self {
        Self {
            near_range: 8,
            trace_outcomes: false,
            raster_output_dir: PathBuf::from("."),
            raster_file_name: "terracull_occlusion_raster.png".to_string(),
            raster_output_interval: Duration::from_secs(1),
        }
    }
}

impl OccluderConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the near occluder range in blocks.
    #[must_use]
    pub fn with_near_range(mut self, blocks: i32) -> Self {
        self.near_range = blocks;
        self
    }

    /// Enable or disable outcome tracing.
    #[must_use]
    pub fn with_trace_outcomes(mut self, trace: bool) -> Self {
        self.trace_outcomes = trace;
        self
    }

    /// Set where raster debug images are written.
    #[must_use]
    pub fn with_raster_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.raster_output_dir = dir.into();
        self
    }

    /// Full path of the periodic raster debug image.
    pub fn raster_output_path(&self) -> PathBuf {
        self.raster_output_dir.join(&self.raster_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = OccluderConfig::new()
            .with_near_range(4)
            .with_trace_outcomes(true)
            .with_raster_output_dir("/tmp/raster");

        assert_eq!(config.near_range, 4);
        assert!(config.trace_outcomes);
        assert_eq!(
            config.raster_output_path(),
            PathBuf::from("/tmp/raster/terracull_occlusion_raster.png")
        );
        assert_eq!(config.raster_output_interval, Duration::from_secs(1));
    }
}

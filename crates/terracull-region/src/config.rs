//! Region storage configuration.

use serde::{Deserialize, Serialize};
use terracull_core::constants::REGION_SIZE;

/// Vertical extent of the world in blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionStorageConfig {
    /// Lowest block Y. Regions starting here do not visit downward.
    pub bottom_y: i32,
    /// One past the highest block Y. Regions ending here do not visit upward.
    pub top_y: i32,
}

impl Default for RegionStorageConfig {
    fn default() -> Self {
        Self {
            bottom_y: -64,
            top_y: 320,
        }
    }
}

impl RegionStorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the vertical bounds. Both must be multiples of the region size.
    #[must_use]
    pub fn with_vertical_bounds(mut self, bottom_y: i32, top_y: i32) -> Self {
        debug_assert!(bottom_y % REGION_SIZE == 0 && top_y % REGION_SIZE == 0);
        debug_assert!(bottom_y < top_y);
        self.bottom_y = bottom_y;
        self.top_y = top_y;
        self
    }

    /// Region origin Y of the lowest region.
    pub const fn bottom_region_y(&self) -> i32 {
        self.bottom_y
    }

    /// Region origin Y of the highest region.
    pub const fn top_region_y(&self) -> i32 {
        self.top_y - REGION_SIZE
    }

    /// Clamp a region origin Y into the world.
    pub fn clamp_region_y(&self, y: i32) -> i32 {
        y.clamp(self.bottom_region_y(), self.top_region_y())
    }
}

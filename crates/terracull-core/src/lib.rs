//! Core types, math, and traits for the terracull occlusion engine.
//!
//! This crate provides the foundational types used throughout the engine:
//! - Region coordinates and distance metrics
//! - Face directions and face flag sets
//! - Bounding box and frustum math
//! - Common error types

pub mod coords;
pub mod error;
pub mod face;
pub mod math;

pub use coords::RegionOrigin;
pub use error::{Error, Result};
pub use face::{Face, FaceFlags};

/// Engine-wide constants
pub mod constants {
    /// Size of a render region in blocks per axis
    pub const REGION_SIZE: i32 = 16;
    /// Bits needed to represent a block position within a region (4 bits for 0-15)
    pub const REGION_BITS: u32 = 4;
    /// Mask selecting the block position within a region
    pub const REGION_MASK: i32 = REGION_SIZE - 1;
    /// Total blocks in a region (16^3)
    pub const REGION_SIZE_CUBED: usize = (REGION_SIZE * REGION_SIZE * REGION_SIZE) as usize;
}

//! Colored light data for terrain regions.
//!
//! Light is stored per 16^3 region as 16-bit texels (see [`Light`]) and
//! packed into a fixed-capacity texture for upload.

pub mod encoding;
pub mod region_data;
pub mod texture;

pub use encoding::Light;
pub use region_data::{LightRegionData, PIXEL_BYTES, REGION_BYTES};
pub use texture::{LightDataTexture, LightSlot};

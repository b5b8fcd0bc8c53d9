//! Software occlusion culling for terrain regions.
//!
//! This crate provides:
//! - A fixed-point rasterizer writing into an 8x8-tile coverage buffer
//! - Box visibility tests and occluder drawing dispatched by face outcome
//! - Frustum snapshots for running occlusion off the main thread
//! - A versioned occluder so cached region results can be reused
//!
//! # Example
//!
//! ```
//! use terracull_core::RegionOrigin;
//! use terracull_occlusion::{FrustumSnapshot, Occluder, OcclusionRange, PackedBox, TerrainCamera};
//!
//! let mut occluder = Occluder::default();
//! occluder.update_frustum(&FrustumSnapshot::capture(&TerrainCamera::default()));
//!
//! if occluder.prepare_scene() {
//!     let origin = RegionOrigin { x: 96, y: 0, z: 0 };
//!     occluder.prepare_region(origin, OcclusionRange::Near, 36);
//!     if occluder.is_box_visible(PackedBox::FULL_BOX) {
//!         occluder.occlude(&[PackedBox::FULL_BOX]);
//!     }
//! }
//! ```

pub mod box_quads;
pub mod config;
pub mod constants;
pub mod error;
pub mod frustum;
pub mod matrix;
pub mod occluder;
pub mod packed_box;
pub mod raster_dump;
pub mod rasterizer;

pub use config::OccluderConfig;
pub use error::{OcclusionError, Result};
pub use frustum::{FrustumExchange, FrustumSnapshot, FrustumSource, TerrainCamera};
pub use matrix::Matrix4L;
pub use occluder::{InvalidationHandle, Occluder};
pub use packed_box::{OcclusionRange, PackedBox};
pub use raster_dump::{raster_image, save_raster_image, RasterDump};
pub use rasterizer::Rasterizer;

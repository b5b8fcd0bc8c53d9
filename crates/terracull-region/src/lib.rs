//! Render region storage and visibility traversal.
//!
//! This crate provides:
//! - An arena of 16^3 regions with lazily linked, symmetric neighbor caches
//! - Face connectivity flags gating which neighbors traversal may enter
//! - Per-region camera and shadow visit state plus cached occlusion results
//! - A distance-ordered occlusion pass built on `terracull-occlusion`

pub mod config;
pub mod mutual_faces;
pub mod pass;
pub mod queue;
pub mod storage;
pub mod visibility;

pub use config::RegionStorageConfig;
pub use mutual_faces::{can_visit_face, MutualFaceFlags};
pub use pass::{OcclusionPass, PassStats};
pub use queue::DistanceQueue;
pub use storage::{Region, RegionId, RegionOccluders, RegionStorage};
pub use visibility::{CameraVisibility, RegionVisibility, ShadowVisibility, VisibilityOutcome};

//! Versioned terrain occluder.
//!
//! Regions are processed front to back. Each region is first tested against
//! the coverage accumulated so far and, when visible, its occluding boxes are
//! drawn into the raster. The occluder version changes every time the raster
//! is cleared so cached per-region results can be checked for staleness.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use terracull_core::{FaceFlags, RegionOrigin};
use tracing::{info, warn};

use crate::box_quads::BOX_QUADS;
use crate::config::OccluderConfig;
use crate::constants::{
    CAMERA_PRECISION_BITS, CAMERA_PRECISION_UNITY, DOWN, EAST, NORTH, SOUTH, UP, WEST,
};
use crate::frustum::{FrustumSnapshot, FrustumSource};
use crate::matrix::Matrix4L;
use crate::packed_box::{OcclusionRange, PackedBox};
use crate::raster_dump::{raster_image, RasterDump};
use crate::rasterizer::Rasterizer;

/// Region offsets beyond which back faces are never visible.
const BACKFACE_POSITIVE_LIMIT: i32 = 48 << CAMERA_PRECISION_BITS;
const BACKFACE_NEGATIVE_LIMIT: i32 = 72 << CAMERA_PRECISION_BITS;

/// Cloneable handle that forces the owning occluder to redraw on its next
/// [`Occluder::prepare_scene`]. Safe to use from any thread.
#[derive(Clone, Debug)]
pub struct InvalidationHandle {
    force_redraw: Arc<AtomicBool>,
}

impl InvalidationHandle {
    pub fn invalidate(&self) {
        self.force_redraw.store(true, Ordering::Release);
    }
}

/// Software occluder for terrain regions.
pub struct Occluder {
    config: OccluderConfig,
    near_range: i32,
    base_mvp: Matrix4L,
    raster: Rasterizer,
    occluder_version: u32,
    // Camera position in camera fixed point.
    view_x: i64,
    view_y: i64,
    view_z: i64,
    // Added to region-relative box coordinates to get camera-relative coordinates,
    // in camera fixed point.
    offset_x: i32,
    offset_y: i32,
    offset_z: i32,
    occlusion_range: OcclusionRange,
    region_squared_chunk_dist: i32,
    view_version: Option<u64>,
    force_redraw: Arc<AtomicBool>,
    needs_redraw: bool,
    max_squared_chunk_distance: i32,
    has_near_occluders: bool,
    /// May lag the live camera by a frame or two; stable for a whole pass.
    frustum: FrustumSnapshot,
    region_origin: RegionOrigin,
    dump: RasterDump,
}

impl Default for Occluder {
    fn default() -> Self {
        Self::new(OccluderConfig::default())
    }
}

impl Occluder {
    pub fn new(config: OccluderConfig) -> Self {
        let near_range = config.near_range << CAMERA_PRECISION_BITS;
        let dump = RasterDump::new(config.raster_output_interval);

        Self {
            config,
            near_range,
            base_mvp: Matrix4L::IDENTITY,
            raster: Rasterizer::new(),
            occluder_version: 1,
            view_x: 0,
            view_y: 0,
            view_z: 0,
            offset_x: 0,
            offset_y: 0,
            offset_z: 0,
            occlusion_range: OcclusionRange::Near,
            region_squared_chunk_dist: 0,
            view_version: None,
            force_redraw: Arc::new(AtomicBool::new(false)),
            needs_redraw: false,
            max_squared_chunk_distance: 0,
            has_near_occluders: false,
            frustum: FrustumSnapshot::default(),
            region_origin: RegionOrigin::default(),
            dump,
        }
    }

    pub fn config(&self) -> &OccluderConfig {
        &self.config
    }

    /// Replace the frustum snapshot used for all following tests.
    ///
    /// Call when the source is known to be consistent, typically from the
    /// main thread between frames.
    pub fn update_frustum(&mut self, frustum: &FrustumSnapshot) {
        self.frustum.copy_from(frustum);
    }

    pub fn frustum(&self) -> &FrustumSnapshot {
        &self.frustum
    }

    pub fn frustum_view_version(&self) -> u64 {
        self.frustum.view_version()
    }

    pub fn frustum_position_version(&self) -> u64 {
        self.frustum.position_version()
    }

    pub fn frustum_camera_pos(&self) -> glam::DVec3 {
        self.frustum.camera_pos()
    }

    pub fn is_region_in_frustum(&self, origin: RegionOrigin) -> bool {
        self.frustum.is_region_visible(origin)
    }

    /// Cached test results are valid only while this matches the version they
    /// were computed against.
    pub fn version(&self) -> u32 {
        self.occluder_version
    }

    /// Request a full redraw on the next [`Occluder::prepare_scene`].
    pub fn invalidate(&self) {
        if self.config.trace_outcomes {
            info!("Invalidating terrain occluder");
        }

        self.force_redraw.store(true, Ordering::Release);
    }

    pub fn invalidation_handle(&self) -> InvalidationHandle {
        InvalidationHandle {
            force_redraw: Arc::clone(&self.force_redraw),
        }
    }

    /// Occlusion range of a region at the given squared block distance.
    pub fn occlusion_range_for(squared_block_distance: i32) -> OcclusionRange {
        OcclusionRange::from_squared_block_distance(squared_block_distance)
    }

    /// Set up the rasterizer transform for boxes of the region at `origin`.
    pub fn prepare_region(
        &mut self,
        origin: RegionOrigin,
        occlusion_range: OcclusionRange,
        squared_chunk_distance: i32,
    ) {
        self.occlusion_range = occlusion_range;
        self.region_squared_chunk_dist = squared_chunk_distance;
        self.region_origin = origin;

        (self.offset_x, self.offset_y, self.offset_z) = self.region_offset(origin);

        self.raster.mvp.copy_from(&self.base_mvp);
        self.raster
            .mvp
            .translate(self.offset_x, self.offset_y, self.offset_z, CAMERA_PRECISION_BITS);
    }

    /// Fixed-point offset of a region origin from the camera.
    fn region_offset(&self, origin: RegionOrigin) -> (i32, i32, i32) {
        (
            ((i64::from(origin.x) << CAMERA_PRECISION_BITS) - self.view_x) as i32,
            ((i64::from(origin.y) << CAMERA_PRECISION_BITS) - self.view_y) as i32,
            ((i64::from(origin.z) << CAMERA_PRECISION_BITS) - self.view_z) as i32,
        )
    }

    /// Start a pass. Returns true when the raster was cleared and every
    /// visible region must be drawn again; when false only regions whose
    /// cached version is stale need drawing.
    pub fn prepare_scene(&mut self) -> bool {
        let view_version = self.frustum.view_version();
        let view_changed = self.view_version != Some(view_version);

        if view_changed {
            let mut base = Matrix4L::IDENTITY;
            base.multiply(&Matrix4L::from_mat4(&self.frustum.projection_matrix()));
            base.multiply(&Matrix4L::from_mat4(&self.frustum.model_matrix()));
            self.base_mvp = base;

            let camera_pos = self.frustum.camera_pos() * CAMERA_PRECISION_UNITY as f64;
            self.view_x = camera_pos.x.round() as i64;
            self.view_y = camera_pos.y.round() as i64;
            self.view_z = camera_pos.z.round() as i64;
        }

        let forced = self.force_redraw.swap(false, Ordering::AcqRel);

        if forced || view_changed {
            if self.config.trace_outcomes {
                if forced {
                    info!("Terrain occluder redrawing due to force redraw");
                } else {
                    info!("Terrain occluder redrawing due to view change");
                }
            }

            self.view_version = Some(view_version);
            self.raster.clear();
            self.needs_redraw = true;
            self.has_near_occluders = false;
            self.max_squared_chunk_distance = 0;
            self.occluder_version = self.occluder_version.wrapping_add(1);
        } else {
            self.needs_redraw = false;
        }

        self.needs_redraw
    }

    /// True if drawn geometry came within the near range of the camera, in
    /// which case small camera moves can change coverage a lot.
    pub fn has_near_occluders(&self) -> bool {
        self.has_near_occluders
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    pub fn max_squared_chunk_distance(&self) -> i32 {
        self.max_squared_chunk_distance
    }

    /// Face outcome of a region-local box given the current camera offset.
    ///
    /// Faces are selected by camera position relative to each face plane,
    /// not by winding. With the camera between two faces of an axis neither
    /// bit for that axis is set.
    fn face_outcome(&self, x0: i32, y0: i32, z0: i32, x1: i32, y1: i32, z1: i32) -> (usize, bool) {
        let near_range = self.near_range;
        let mut outcome = 0;
        let mut has_near = true;

        let top = (y1 << CAMERA_PRECISION_BITS) + self.offset_y;
        if top < 0 {
            outcome |= UP;
            has_near &= top > -near_range;
        } else {
            let bottom = (y0 << CAMERA_PRECISION_BITS) + self.offset_y;
            if bottom > 0 {
                outcome |= DOWN;
                has_near &= bottom < near_range;
            }
        }

        let east = (x1 << CAMERA_PRECISION_BITS) + self.offset_x;
        if east < 0 {
            outcome |= EAST;
            has_near &= east > -near_range;
        } else {
            let west = (x0 << CAMERA_PRECISION_BITS) + self.offset_x;
            if west > 0 {
                outcome |= WEST;
                has_near &= west < near_range;
            }
        }

        let south = (z1 << CAMERA_PRECISION_BITS) + self.offset_z;
        if south < 0 {
            outcome |= SOUTH;
            has_near &= south > -near_range;
        } else {
            let north = (z0 << CAMERA_PRECISION_BITS) + self.offset_z;
            if north > 0 {
                outcome |= NORTH;
                has_near &= north < near_range;
            }
        }

        (outcome, has_near)
    }

    #[allow(clippy::too_many_arguments)]
    fn setup_box_vertices(&mut self, mask: u8, x0: i32, y0: i32, z0: i32, x1: i32, y1: i32, z1: i32) {
        for v in 0..8u8 {
            if mask & (1 << v) != 0 {
                let x = if v & 0b100 != 0 { x1 } else { x0 };
                let y = if v & 0b010 != 0 { y1 } else { y0 };
                let z = if v & 0b001 != 0 { z1 } else { z0 };
                self.raster.setup_vertex(v, x, y, z);
            }
        }
    }

    /// True if any part of the box, padded by one block on every side, is
    /// not yet covered. A camera inside the padded box always sees it.
    pub fn is_box_visible(&mut self, packed: PackedBox) -> bool {
        let x0 = packed.x0() - 1;
        let y0 = packed.y0() - 1;
        let z0 = packed.z0() - 1;
        let x1 = packed.x1() + 1;
        let y1 = packed.y1() + 1;
        let z1 = packed.z1() + 1;

        let (outcome, _) = self.face_outcome(x0, y0, z0, x1, y1, z1);
        if outcome == 0 {
            return true;
        }

        let quads = &BOX_QUADS[outcome];
        self.setup_box_vertices(quads.vertex_mask(), x0, y0, z0, x1, y1, z1);
        quads
            .quads()
            .iter()
            .any(|&[a, b, c, d]| self.raster.test_quad(a, b, c, d))
    }

    /// Test a region with no occluding geometry as a full box.
    pub fn is_empty_region_visible(&mut self, origin: RegionOrigin) -> bool {
        self.prepare_region(origin, OcclusionRange::Near, 0);
        self.is_box_visible(PackedBox::FULL_BOX)
    }

    fn occlude_box(&mut self, packed: PackedBox) {
        let (x0, y0, z0) = (packed.x0(), packed.y0(), packed.z0());
        let (x1, y1, z1) = (packed.x1(), packed.y1(), packed.z1());

        let (outcome, has_near) = self.face_outcome(x0, y0, z0, x1, y1, z1);
        self.has_near_occluders |= has_near;

        let quads = &BOX_QUADS[outcome];
        self.setup_box_vertices(quads.vertex_mask(), x0, y0, z0, x1, y1, z1);
        for &[a, b, c, d] in quads.quads() {
            self.raster.draw_quad(a, b, c, d);
        }
    }

    /// Draw the occluding boxes of the prepared region.
    ///
    /// Boxes must be ordered by descending range; drawing stops at the first
    /// box whose range is below the region's occlusion range.
    pub fn occlude(&mut self, boxes: &[PackedBox]) {
        let mut drew_any = false;

        for &packed in boxes {
            if packed.range() < self.occlusion_range {
                break;
            }

            drew_any = true;
            self.occlude_box(packed);
        }

        if !drew_any {
            return;
        }

        let dist = self.region_squared_chunk_dist;

        if self.config.trace_outcomes && dist < self.max_squared_chunk_distance {
            let o = self.region_origin;
            warn!(
                "Terrain occluder went backwards in chunk distance @ {}, {}, {}",
                o.x, o.y, o.z
            );
        }

        if self.max_squared_chunk_distance < dist {
            if self.config.trace_outcomes {
                info!("Occluder advancing to dist {dist}");
            }
            self.max_squared_chunk_distance = dist;
        }
    }

    /// Faces of the prepared region whose back sides can still be seen.
    /// Geometry facing any other direction can be skipped when drawing.
    pub fn backface_visibility_flags(&self) -> FaceFlags {
        backface_flags(self.offset_x, self.offset_y, self.offset_z)
    }

    /// [`Self::backface_visibility_flags`] for any region, without preparing it.
    pub fn region_backface_visibility_flags(&self, origin: RegionOrigin) -> FaceFlags {
        let (x, y, z) = self.region_offset(origin);
        backface_flags(x, y, z)
    }

    pub fn raster(&self) -> &Rasterizer {
        &self.raster
    }

    /// Deep copy of another occluder's state for double buffering.
    ///
    /// The frustum snapshot, configuration and debug writer are not copied.
    pub fn copy_from(&mut self, source: &Self) {
        self.base_mvp.copy_from(&source.base_mvp);
        self.raster.copy_from(&source.raster);
        self.view_x = source.view_x;
        self.view_y = source.view_y;
        self.view_z = source.view_z;
        self.offset_x = source.offset_x;
        self.offset_y = source.offset_y;
        self.offset_z = source.offset_z;
        self.occlusion_range = source.occlusion_range;
        self.region_squared_chunk_dist = source.region_squared_chunk_dist;
        self.view_version = source.view_version;
        self.occluder_version = source.occluder_version;
        self.max_squared_chunk_distance = source.max_squared_chunk_distance;
        self.has_near_occluders = source.has_near_occluders;
        self.force_redraw.store(
            source.force_redraw.load(Ordering::Acquire),
            Ordering::Release,
        );
        self.needs_redraw = source.needs_redraw;
    }

    /// Write the raster to the configured debug image path in the background.
    ///
    /// Unforced calls write at most once per configured interval.
    pub fn output_raster(&mut self, force: bool) {
        if !self.dump.due(Instant::now(), force) {
            return;
        }

        let path = self.config.raster_output_path();
        if let Err(e) = self.dump.submit(raster_image(&self.raster), path) {
            warn!("Couldn't save occluder image: {e}");
        }
    }
}

fn backface_flags(offset_x: i32, offset_y: i32, offset_z: i32) -> FaceFlags {
    let mut flags = FaceFlags::empty();

    if offset_y < BACKFACE_POSITIVE_LIMIT {
        flags |= FaceFlags::UP;
    } else if offset_y > -BACKFACE_NEGATIVE_LIMIT {
        flags |= FaceFlags::DOWN;
    }

    if offset_x < BACKFACE_POSITIVE_LIMIT {
        flags |= FaceFlags::EAST;
    } else if offset_x > -BACKFACE_NEGATIVE_LIMIT {
        flags |= FaceFlags::WEST;
    }

    if offset_z < BACKFACE_POSITIVE_LIMIT {
        flags |= FaceFlags::SOUTH;
    } else if offset_z > -BACKFACE_NEGATIVE_LIMIT {
        flags |= FaceFlags::NORTH;
    }

    flags
}

impl fmt::Display for Occluder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OccluderVersion:{}  viewX:{}  viewY:{}  viewZ:{}  offsetX:{}  offsetY:{}  offsetZ:{}  viewVersion:{:?}  forceRedraw:{}  needsRedraw:{}  matrix:{}",
            self.occluder_version,
            self.view_x,
            self.view_y,
            self.view_z,
            self.offset_x,
            self.offset_y,
            self.offset_z,
            self.view_version,
            self.force_redraw.load(Ordering::Relaxed),
            self.needs_redraw,
            self.raster.mvp,
        )
    }
}

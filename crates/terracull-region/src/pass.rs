//! Front-to-back occlusion pass over the region graph.

use terracull_core::{FaceFlags, RegionOrigin};
use terracull_occlusion::{Occluder, OcclusionRange};
use tracing::{debug, trace};

use crate::queue::DistanceQueue;
use crate::storage::{RegionId, RegionStorage};
use crate::visibility::VisibilityOutcome;

/// Counters from one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// True when the occluder was cleared at the start of the pass.
    pub redrawn: bool,
    pub visited: u32,
    pub visible: u32,
    pub occluded: u32,
    /// Regions whose cached result was still current.
    pub reused: u32,
    /// Regions tested again because nearer occluders were drawn after their
    /// cached result was recorded.
    pub stale: u32,
    /// Regions whose occluders were drawn this pass.
    pub drawn: u32,
}

/// Walks outward from the camera region in distance order, testing each
/// region against the occluder and drawing the occluders of visible ones.
///
/// Only visible regions spread the traversal, and only through faces their
/// geometry leaves open.
pub struct OcclusionPass {
    max_squared_chunk_distance: i32,
    visit_version: u32,
    queue: DistanceQueue,
    visible: Vec<RegionId>,
    backface_flags: Vec<FaceFlags>,
}

impl OcclusionPass {
    /// Regions farther than `view_distance` chunks are not visited.
    pub fn new(view_distance: i32) -> Self {
        Self {
            max_squared_chunk_distance: view_distance * view_distance,
            visit_version: 0,
            queue: DistanceQueue::new(),
            visible: Vec::new(),
            backface_flags: Vec::new(),
        }
    }

    /// Takes effect on the next pass. Cached results stay valid.
    pub fn set_view_distance(&mut self, view_distance: i32) {
        self.max_squared_chunk_distance = view_distance * view_distance;
    }

    /// Visible regions from the last pass, near to far.
    pub fn visible_regions(&self) -> &[RegionId] {
        &self.visible
    }

    /// Per visible region, in the same order, the faces whose geometry can
    /// face the camera.
    pub fn backface_flags(&self) -> &[FaceFlags] {
        &self.backface_flags
    }

    pub fn run(&mut self, storage: &mut RegionStorage, occluder: &mut Occluder) -> PassStats {
        let mut stats = PassStats {
            redrawn: occluder.prepare_scene(),
            ..PassStats::default()
        };

        self.visit_version = self.visit_version.wrapping_add(1).max(1);
        self.queue.clear();
        self.visible.clear();
        self.backface_flags.clear();

        let camera_pos = occluder.frustum_camera_pos();
        storage.set_camera_position(camera_pos);

        let mut start = RegionOrigin::containing_point(camera_pos);
        start.y = storage.config().clamp_region_y(start.y);
        let start = storage.get_or_create(start);

        let Some(region) = storage.region_mut(start) else {
            return stats;
        };
        region.camera_visibility.start(self.visit_version);
        self.queue.push(start, region.squared_chunk_distance());

        let occluder_version = occluder.version();

        while let Some((id, dist)) = self.queue.pop() {
            if dist > self.max_squared_chunk_distance {
                continue;
            }

            let Some(region) = storage.region(id) else {
                continue;
            };
            let origin = region.origin();

            if id != start && !occluder.is_region_in_frustum(origin) {
                continue;
            }

            stats.visited += 1;

            let mutual_faces = region.mutual_faces();
            let occluder_distance = occluder.max_squared_chunk_distance();
            let cached = region.visibility.current_outcome(occluder_version);
            let stale = cached.is_some() && region.visibility.is_stale(dist, occluder_distance);
            if stale {
                stats.stale += 1;
                trace!("Cached result for {:?} is stale, testing again", origin);
            }

            let visible = if let Some(outcome) = cached.filter(|_| !stale) {
                stats.reused += 1;
                outcome == VisibilityOutcome::Visible
            } else {
                let range = OcclusionRange::from_squared_block_distance(
                    origin.squared_block_distance(camera_pos),
                );
                let occluders = region.occluders();

                let visible = if id == start {
                    true
                } else if let Some(occluders) = occluders {
                    occluder.prepare_region(origin, range, dist);
                    occluder.is_box_visible(occluders.bounds())
                } else {
                    occluder.is_empty_region_visible(origin)
                };

                if visible {
                    if let Some(occluders) = occluders {
                        occluder.prepare_region(origin, range, dist);
                        occluder.occlude(occluders.boxes());
                        stats.drawn += 1;
                    }
                }

                let outcome = if visible {
                    VisibilityOutcome::Visible
                } else {
                    VisibilityOutcome::Occluded
                };

                if let Some(region) = storage.region_mut(id) {
                    region.visibility.set(
                        occluder_version,
                        outcome,
                        occluder.max_squared_chunk_distance(),
                    );
                }

                visible
            };

            if visible {
                stats.visible += 1;
                self.visible.push(id);
                self.backface_flags.push(occluder.region_backface_visibility_flags(origin));
                storage.enqueue_unvisited_neighbors(id, self.visit_version, mutual_faces, &mut self.queue);
            } else {
                stats.occluded += 1;
                trace!("Region {:?} occluded", origin);
            }
        }

        debug!(
            "Occlusion pass: visited {} visible {} occluded {} reused {} drawn {}",
            stats.visited, stats.visible, stats.occluded, stats.reused, stats.drawn
        );

        stats
    }
}

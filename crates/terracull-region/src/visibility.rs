//! Per-region traversal and visibility state.

use terracull_core::FaceFlags;

/// Camera traversal state of one region.
///
/// The visit version identifies the traversal pass; entry faces accumulate
/// every face through which the region was reached during that pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CameraVisibility {
    visit_version: u32,
    entry_faces: FaceFlags,
}

impl CameraVisibility {
    /// Mark as the traversal start. The camera region has no entry faces.
    pub fn start(&mut self, visit_version: u32) {
        self.visit_version = visit_version;
        self.entry_faces = FaceFlags::empty();
    }

    /// Record a visit through `from_face` from a region at `from_squared_dist`.
    ///
    /// Regions closer to the camera than the visitor are ignored. Returns
    /// true the first time the region is reached in this pass, meaning the
    /// caller should enqueue it; later visits only add entry faces.
    pub fn add_if_front_facing(
        &mut self,
        visit_version: u32,
        from_face: FaceFlags,
        from_squared_dist: i32,
        squared_dist: i32,
    ) -> bool {
        if squared_dist < from_squared_dist {
            return false;
        }

        if self.visit_version == visit_version {
            self.entry_faces |= from_face;
            false
        } else {
            self.visit_version = visit_version;
            self.entry_faces = from_face;
            true
        }
    }

    pub const fn visit_version(&self) -> u32 {
        self.visit_version
    }

    pub const fn entry_faces(&self) -> FaceFlags {
        self.entry_faces
    }
}

/// Shadow traversal state. Shadow passes spread without distance ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadowVisibility {
    visit_version: u32,
    entry_faces: FaceFlags,
}

impl ShadowVisibility {
    pub fn start(&mut self, visit_version: u32) {
        self.visit_version = visit_version;
        self.entry_faces = FaceFlags::empty();
    }

    /// Returns true the first time the region is reached in this pass.
    pub fn add_if_valid(&mut self, visit_version: u32, from_face: FaceFlags) -> bool {
        if self.visit_version == visit_version {
            self.entry_faces |= from_face;
            false
        } else {
            self.visit_version = visit_version;
            self.entry_faces = from_face;
            true
        }
    }

    pub const fn visit_version(&self) -> u32 {
        self.visit_version
    }

    pub const fn entry_faces(&self) -> FaceFlags {
        self.entry_faces
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VisibilityOutcome {
    #[default]
    Unknown,
    Visible,
    Occluded,
}

/// Cached occlusion test result of one region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegionVisibility {
    /// Occluder version the result was computed against. Zero is never current.
    version: u32,
    outcome: VisibilityOutcome,
    /// Occluder max squared chunk distance when the result was computed.
    occluder_distance: i32,
}

impl RegionVisibility {
    pub fn set(&mut self, version: u32, outcome: VisibilityOutcome, occluder_distance: i32) {
        self.version = version;
        self.outcome = outcome;
        self.occluder_distance = occluder_distance;
    }

    /// Forget the cached result.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub const fn version(&self) -> u32 {
        self.version
    }

    pub const fn outcome(&self) -> VisibilityOutcome {
        self.outcome
    }

    pub const fn occluder_distance(&self) -> i32 {
        self.occluder_distance
    }

    /// The cached outcome if it was computed against `occluder_version`.
    pub fn current_outcome(&self, occluder_version: u32) -> Option<VisibilityOutcome> {
        (self.version == occluder_version && self.outcome != VisibilityOutcome::Unknown)
            .then_some(self.outcome)
    }

    /// True when occluders were drawn since the result was recorded that may
    /// hide a region at `squared_chunk_distance`, and the raster holds nothing
    /// farther than the region so it can be tested again.
    pub const fn is_stale(&self, squared_chunk_distance: i32, occluder_distance: i32) -> bool {
        occluder_distance > self.occluder_distance && squared_chunk_distance > occluder_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_visit_enqueues_once() {
        let mut vis = CameraVisibility::default();

        assert!(vis.add_if_front_facing(1, FaceFlags::WEST, 4, 5));
        assert!(!vis.add_if_front_facing(1, FaceFlags::DOWN, 4, 5));
        assert_eq!(vis.entry_faces(), FaceFlags::WEST | FaceFlags::DOWN);

        // new pass starts over
        assert!(vis.add_if_front_facing(2, FaceFlags::NORTH, 4, 5));
        assert_eq!(vis.entry_faces(), FaceFlags::NORTH);
    }

    #[test]
    fn closer_regions_are_not_revisited() {
        let mut vis = CameraVisibility::default();
        assert!(!vis.add_if_front_facing(1, FaceFlags::EAST, 9, 4));
        assert_eq!(vis.visit_version(), 0);

        // equal distance is allowed
        assert!(vis.add_if_front_facing(1, FaceFlags::EAST, 4, 4));
    }

    #[test]
    fn start_clears_entry_faces() {
        let mut vis = CameraVisibility::default();
        vis.add_if_front_facing(3, FaceFlags::UP, 0, 1);
        vis.start(3);
        assert!(vis.entry_faces().is_empty());
        assert!(!vis.add_if_front_facing(3, FaceFlags::UP, 0, 1));
    }

    #[test]
    fn cached_result_only_for_matching_version() {
        let mut vis = RegionVisibility::default();
        assert_eq!(vis.current_outcome(0), None);

        vis.set(7, VisibilityOutcome::Occluded, 12);
        assert_eq!(vis.current_outcome(7), Some(VisibilityOutcome::Occluded));
        assert_eq!(vis.current_outcome(8), None);
        assert_eq!(vis.occluder_distance(), 12);

        vis.reset();
        assert_eq!(vis.current_outcome(7), None);
    }

    #[test]
    fn result_goes_stale_only_beyond_new_occluders() {
        let mut vis = RegionVisibility::default();
        vis.set(3, VisibilityOutcome::Visible, 4);

        // nothing drawn since
        assert!(!vis.is_stale(16, 4));
        // occluders advanced to 9, region lies beyond them
        assert!(vis.is_stale(16, 9));
        // raster already holds geometry at or past the region
        assert!(!vis.is_stale(9, 9));
        assert!(!vis.is_stale(8, 9));
    }

    #[test]
    fn shadow_visits_ignore_distance() {
        let mut vis = ShadowVisibility::default();
        assert!(vis.add_if_valid(1, FaceFlags::UP));
        assert!(!vis.add_if_valid(1, FaceFlags::EAST));
        assert_eq!(vis.entry_faces(), FaceFlags::UP | FaceFlags::EAST);
    }
}

//! Region arena with lazily linked neighbors.
//!
//! Regions are created on demand as traversal reaches them. Neighbor links
//! are cached in both directions when first followed and removed from the
//! surviving side when a region closes.

use glam::{DVec3, IVec3};
use hashbrown::HashMap;
use terracull_core::constants::REGION_MASK;
use terracull_core::{Face, RegionOrigin};
use terracull_occlusion::PackedBox;
use tracing::debug;

use crate::config::RegionStorageConfig;
use crate::mutual_faces::{can_visit_face, MutualFaceFlags};
use crate::queue::DistanceQueue;
use crate::visibility::{CameraVisibility, RegionVisibility, ShadowVisibility};

/// Handle to a region slot. Stale after the region closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionId {
    index: u32,
    generation: u32,
}

impl RegionId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Occlusion geometry of a built region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionOccluders {
    bounds: PackedBox,
    boxes: Vec<PackedBox>,
    mutual_faces: MutualFaceFlags,
}

impl RegionOccluders {
    /// Boxes are reordered by descending range so distant regions can stop
    /// drawing at the first box below their occlusion range.
    pub fn new(bounds: PackedBox, mut boxes: Vec<PackedBox>, mutual_faces: MutualFaceFlags) -> Self {
        boxes.sort_by(|a, b| b.range().cmp(&a.range()));
        Self {
            bounds,
            boxes,
            mutual_faces,
        }
    }

    /// A completely solid region.
    pub fn solid() -> Self {
        Self::new(PackedBox::FULL_BOX, vec![PackedBox::FULL_BOX], MutualFaceFlags::EMPTY)
    }

    /// Bounds of all renderable content, used for the visibility test.
    pub const fn bounds(&self) -> PackedBox {
        self.bounds
    }

    pub fn boxes(&self) -> &[PackedBox] {
        &self.boxes
    }

    pub const fn mutual_faces(&self) -> MutualFaceFlags {
        self.mutual_faces
    }
}

/// One 16^3 render region.
#[derive(Debug)]
pub struct Region {
    origin: RegionOrigin,
    is_bottom: bool,
    is_top: bool,
    neighbors: [Option<RegionId>; 6],
    squared_chunk_distance: i32,
    occluders: Option<RegionOccluders>,
    pub camera_visibility: CameraVisibility,
    pub shadow_visibility: ShadowVisibility,
    pub visibility: RegionVisibility,
}

impl Region {
    pub const fn origin(&self) -> RegionOrigin {
        self.origin
    }

    pub const fn is_top(&self) -> bool {
        self.is_top
    }

    pub const fn is_bottom(&self) -> bool {
        self.is_bottom
    }

    /// Cached neighbor link, if it has been followed.
    pub const fn cached_neighbor(&self, face: Face) -> Option<RegionId> {
        self.neighbors[face as usize]
    }

    pub const fn squared_chunk_distance(&self) -> i32 {
        self.squared_chunk_distance
    }

    /// Occlusion geometry, `None` while the region is empty or unbuilt.
    pub const fn occluders(&self) -> Option<&RegionOccluders> {
        self.occluders.as_ref()
    }

    /// Face connectivity. Regions without geometry are open in every direction.
    pub fn mutual_faces(&self) -> MutualFaceFlags {
        self.occluders
            .as_ref()
            .map_or(MutualFaceFlags::ALL, RegionOccluders::mutual_faces)
    }

    fn attach_or_confirm_visiting_neighbor(&mut self, face: Face, visitor: RegionId) {
        debug_assert!(
            self.neighbors[face as usize].map_or(true, |n| n == visitor),
            "Visiting region is attaching to a position that already has a different region"
        );
        self.neighbors[face as usize] = Some(visitor);
    }

    fn notify_neighbor_closed(&mut self, face: Face, closing: RegionId) {
        debug_assert!(
            self.neighbors[face as usize] == Some(closing),
            "Closing neighbor region does not match current attachment"
        );
        self.neighbors[face as usize] = None;
    }
}

struct Slot {
    generation: u32,
    region: Option<Region>,
}

/// Arena of regions keyed by origin.
pub struct RegionStorage {
    config: RegionStorageConfig,
    index: HashMap<RegionOrigin, RegionId>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    camera_chunk: IVec3,
}

impl RegionStorage {
    pub fn new(config: RegionStorageConfig) -> Self {
        Self {
            config,
            index: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            camera_chunk: IVec3::ZERO,
        }
    }

    pub const fn config(&self) -> &RegionStorageConfig {
        &self.config
    }

    /// Number of live regions.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, origin: RegionOrigin) -> Option<RegionId> {
        self.index.get(&origin).copied()
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.region.as_ref())
    }

    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.region.as_mut())
    }

    /// Iterate live regions.
    pub fn regions(&self) -> impl Iterator<Item = (RegionId, &Region)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.region
                .as_ref()
                .map(|r| (RegionId::new(i as u32, slot.generation), r))
        })
    }

    /// Whether a region at `origin` lies inside the world's vertical bounds.
    pub const fn is_in_world(&self, origin: RegionOrigin) -> bool {
        origin.y >= self.config.bottom_region_y() && origin.y <= self.config.top_region_y()
    }

    pub fn get_or_create(&mut self, origin: RegionOrigin) -> RegionId {
        debug_assert!(
            origin.x & REGION_MASK == 0 && origin.y & REGION_MASK == 0 && origin.z & REGION_MASK == 0,
            "Region origin {origin:?} is not aligned"
        );

        if let Some(id) = self.get(origin) {
            return id;
        }

        let region = Region {
            origin,
            is_bottom: origin.y <= self.config.bottom_region_y(),
            is_top: origin.y >= self.config.top_region_y(),
            neighbors: [None; 6],
            squared_chunk_distance: origin.squared_chunk_distance(self.camera_chunk),
            occluders: None,
            camera_visibility: CameraVisibility::default(),
            shadow_visibility: ShadowVisibility::default(),
            visibility: RegionVisibility::default(),
        };

        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.region = Some(region);
            RegionId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                region: Some(region),
            });
            RegionId::new(index, 0)
        };

        self.index.insert(origin, id);
        id
    }

    /// Adjacent region across `face`, creating and linking it if needed.
    ///
    /// `None` when `id` is stale or the face leaves the top or bottom of the world.
    pub fn neighbor(&mut self, id: RegionId, face: Face) -> Option<RegionId> {
        let region = self.region(id)?;

        if (face == Face::Up && region.is_top) || (face == Face::Down && region.is_bottom) {
            return None;
        }

        if let Some(n) = region.neighbors[face as usize] {
            if self.region(n).is_some() {
                return Some(n);
            }
        }

        let neighbor_origin = region.origin.neighbor(face);
        let neighbor = self.get_or_create(neighbor_origin);

        if let Some(region) = self.region_mut(id) {
            region.neighbors[face as usize] = Some(neighbor);
        }
        if let Some(other) = self.region_mut(neighbor) {
            other.attach_or_confirm_visiting_neighbor(face.opposite(), id);
        }

        Some(neighbor)
    }

    /// Close the region at `origin`, detaching it from its neighbors.
    pub fn close(&mut self, origin: RegionOrigin) -> bool {
        let Some(id) = self.index.remove(&origin) else {
            return false;
        };

        let slot = &mut self.slots[id.index as usize];
        let Some(region) = slot.region.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);

        for face in Face::ALL {
            if let Some(n) = region.neighbors[face as usize] {
                if let Some(other) = self.region_mut(n) {
                    other.notify_neighbor_closed(face.opposite(), id);
                }
            }
        }

        debug!("Closed region {:?}", origin);
        true
    }

    /// Replace the occlusion geometry of a region, dropping its cached result.
    ///
    /// The occluder should be invalidated afterwards so regions drawn from
    /// the old geometry are redrawn.
    pub fn set_occluders(&mut self, origin: RegionOrigin, occluders: Option<RegionOccluders>) -> RegionId {
        let id = self.get_or_create(origin);
        if let Some(region) = self.region_mut(id) {
            region.occluders = occluders;
            region.visibility.reset();
        }
        id
    }

    pub const fn camera_chunk(&self) -> IVec3 {
        self.camera_chunk
    }

    /// Update the camera position, refreshing region distances when the
    /// camera moved to another chunk.
    pub fn set_camera_position(&mut self, pos: DVec3) {
        let chunk = RegionOrigin::containing_point(pos).chunk();
        if chunk == self.camera_chunk {
            return;
        }

        self.camera_chunk = chunk;
        for region in self.slots.iter_mut().filter_map(|s| s.region.as_mut()) {
            region.squared_chunk_distance = region.origin.squared_chunk_distance(chunk);
        }
    }

    /// Offer each neighbor reachable through open space to the camera traversal.
    ///
    /// Neighbors closer to the camera than `id` are skipped; neighbors reached
    /// for the first time in `visit_version` are pushed onto `queue`.
    pub fn enqueue_unvisited_neighbors(
        &mut self,
        id: RegionId,
        visit_version: u32,
        mutual_faces: MutualFaceFlags,
        queue: &mut DistanceQueue,
    ) {
        let Some(region) = self.region(id) else {
            return;
        };
        let my_dist = region.squared_chunk_distance;
        let entry_faces = region.camera_visibility.entry_faces();

        for face in [Face::East, Face::West, Face::North, Face::South, Face::Up, Face::Down] {
            if !can_visit_face(mutual_faces, entry_faces, face) {
                continue;
            }

            let Some(n) = self.neighbor(id, face) else {
                continue;
            };

            if let Some(neighbor) = self.region_mut(n) {
                let dist = neighbor.squared_chunk_distance;
                let from = face.opposite().flag();
                if neighbor
                    .camera_visibility
                    .add_if_front_facing(visit_version, from, my_dist, dist)
                {
                    queue.push(n, dist);
                }
            }
        }
    }

    /// Offer every neighbor to the shadow traversal.
    pub fn enqueue_unvisited_shadow_neighbors(
        &mut self,
        id: RegionId,
        visit_version: u32,
        queue: &mut Vec<RegionId>,
    ) {
        for face in [Face::East, Face::West, Face::North, Face::South, Face::Up, Face::Down] {
            let Some(n) = self.neighbor(id, face) else {
                continue;
            };

            if let Some(neighbor) = self.region_mut(n) {
                if neighbor
                    .shadow_visibility
                    .add_if_valid(visit_version, face.opposite().flag())
                {
                    queue.push(n);
                }
            }
        }
    }
}

impl Default for RegionStorage {
    fn default() -> Self {
        Self::new(RegionStorageConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terracull_core::FaceFlags;

    fn origin(cx: i32, cy: i32, cz: i32) -> RegionOrigin {
        RegionOrigin::from_chunk(IVec3::new(cx, cy, cz))
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let mut storage = RegionStorage::default();
        let a = storage.get_or_create(origin(1, 2, 3));
        let b = storage.get_or_create(origin(1, 2, 3));
        assert_eq!(a, b);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn neighbor_links_are_symmetric() {
        let mut storage = RegionStorage::default();
        let a = storage.get_or_create(origin(0, 0, 0));
        let b = storage.neighbor(a, Face::East).unwrap();

        assert_eq!(storage.region(b).unwrap().origin(), origin(1, 0, 0));
        assert_eq!(storage.region(a).unwrap().cached_neighbor(Face::East), Some(b));
        assert_eq!(storage.region(b).unwrap().cached_neighbor(Face::West), Some(a));
        assert_eq!(storage.neighbor(b, Face::West), Some(a));
    }

    #[test]
    fn closing_detaches_neighbors() {
        let mut storage = RegionStorage::default();
        let a = storage.get_or_create(origin(0, 0, 0));
        let b = storage.neighbor(a, Face::South).unwrap();

        assert!(storage.close(origin(0, 0, 1)));
        assert!(storage.region(b).is_none());
        assert_eq!(storage.region(a).unwrap().cached_neighbor(Face::South), None);
        assert!(!storage.close(origin(0, 0, 1)));

        // reopening creates a fresh region with a new handle
        let c = storage.neighbor(a, Face::South).unwrap();
        assert_ne!(b, c);
        assert_eq!(storage.region(c).unwrap().cached_neighbor(Face::North), Some(a));
    }

    #[test]
    fn world_limits_stop_vertical_links() {
        let config = RegionStorageConfig::new().with_vertical_bounds(0, 32);
        let mut storage = RegionStorage::new(config);

        let bottom = storage.get_or_create(origin(0, 0, 0));
        assert!(storage.region(bottom).unwrap().is_bottom());
        assert_eq!(storage.neighbor(bottom, Face::Down), None);

        let top = storage.neighbor(bottom, Face::Up).unwrap();
        assert!(storage.region(top).unwrap().is_top());
        assert_eq!(storage.neighbor(top, Face::Up), None);
    }

    #[test]
    fn enqueue_skips_closer_and_blocked_faces() {
        let mut storage = RegionStorage::default();
        storage.set_camera_position(DVec3::splat(8.0));

        let start = storage.get_or_create(origin(1, 0, 0));
        storage
            .region_mut(start)
            .unwrap()
            .camera_visibility
            .add_if_front_facing(1, FaceFlags::WEST, 0, 1);

        let mut queue = DistanceQueue::new();
        let tunnel = MutualFaceFlags::from_connected_set(FaceFlags::WEST | FaceFlags::EAST);
        storage.enqueue_unvisited_neighbors(start, 1, tunnel, &mut queue);

        let (next, dist) = queue.pop().unwrap();
        assert_eq!(storage.region(next).unwrap().origin(), origin(2, 0, 0));
        assert_eq!(dist, 4);
        assert!(queue.is_empty());
        assert_eq!(
            storage.region(next).unwrap().camera_visibility.entry_faces(),
            FaceFlags::WEST
        );
    }

    #[test]
    fn camera_region_enqueues_all_neighbors() {
        let mut storage = RegionStorage::default();
        let start = storage.get_or_create(origin(0, 0, 0));
        storage.region_mut(start).unwrap().camera_visibility.start(1);

        let mut queue = DistanceQueue::new();
        storage.enqueue_unvisited_neighbors(start, 1, MutualFaceFlags::EMPTY, &mut queue);
        assert_eq!(queue.len(), 6);
    }

    #[test]
    fn camera_move_updates_distances() {
        let mut storage = RegionStorage::default();
        let id = storage.get_or_create(origin(3, 0, 0));
        assert_eq!(storage.region(id).unwrap().squared_chunk_distance(), 9);

        storage.set_camera_position(DVec3::new(40.0, 3.0, 3.0));
        assert_eq!(storage.region(id).unwrap().squared_chunk_distance(), 1);
    }

    #[test]
    fn occluder_boxes_sorted_by_range() {
        use terracull_occlusion::OcclusionRange;

        let near = PackedBox::new(0, 0, 0, 2, 2, 2, OcclusionRange::Near);
        let far = PackedBox::new(0, 0, 0, 8, 8, 8, OcclusionRange::Far);
        let occluders = RegionOccluders::new(PackedBox::FULL_BOX, vec![near, far], MutualFaceFlags::ALL);
        assert_eq!(occluders.boxes(), &[far, near]);
    }
}

//! Synthetic terrain and the per-frame consumers of visibility results.

use glam::IVec3;
use hashbrown::HashMap;
use terracull_cluster::{
    ClusterRealm, IndexSlabPool, RealmDrawList, SlabAllocation, SlabId, VertexSlab,
    MAX_SLAB_QUAD_VERTEX_COUNT, QUAD_VERTICES,
};
use terracull_core::constants::REGION_SIZE;
use terracull_core::{FaceFlags, RegionOrigin};
use terracull_light::{Light, LightDataTexture, LightRegionData};
use terracull_occlusion::{OcclusionRange, PackedBox};
use terracull_region::{MutualFaceFlags, RegionId, RegionOccluders, RegionStorage, RegionStorageConfig};
use tracing::{debug, warn};

const BOTTOM_Y: i32 = -64;
const TOP_Y: i32 = 192;

/// Visible regions per cluster draw list.
const CLUSTER_SIZE: usize = 32;

/// Terrain height in blocks at a world column.
pub fn surface_height(x: i32, z: i32) -> f64 {
    let (x, z) = (f64::from(x), f64::from(z));
    48.0 + 28.0 * (x * 0.011).sin() * (z * 0.017).cos() + 10.0 * (x * 0.043 + z * 0.029).sin()
}

/// Fill a square of region columns around the origin with heightmap occluders.
///
/// Regions fully below the surface are solid and closed to traversal. The
/// region holding the surface gets a ground slab and stays open everywhere
/// but down. Air above is left for traversal to create on demand.
pub fn build_terrain(radius: i32) -> RegionStorage {
    let config = RegionStorageConfig::new().with_vertical_bounds(BOTTOM_Y, TOP_Y);
    let mut storage = RegionStorage::new(config);
    let open_above = MutualFaceFlags::from_connected_set(FaceFlags::all() - FaceFlags::DOWN);

    for cx in -radius..=radius {
        for cz in -radius..=radius {
            let height = surface_height(cx * REGION_SIZE + REGION_SIZE / 2, cz * REGION_SIZE + REGION_SIZE / 2)
                .floor() as i32;

            let bottom_cy = BOTTOM_Y >> 4;
            let surface_cy = height >> 4;

            for cy in bottom_cy..surface_cy {
                let solid = RegionOccluders::new(PackedBox::FULL_BOX, vec![PackedBox::FULL_BOX], MutualFaceFlags::EMPTY);
                storage.set_occluders(RegionOrigin::from_chunk(IVec3::new(cx, cy, cz)), Some(solid));
            }

            let fill = (height - (surface_cy << 4)) as u32;
            if fill > 0 {
                let range = if fill >= 8 {
                    OcclusionRange::Extreme
                } else {
                    OcclusionRange::Far
                };
                let ground = PackedBox::new(0, 0, 0, 16, fill, 16, range);
                storage.set_occluders(
                    RegionOrigin::from_chunk(IVec3::new(cx, surface_cy, cz)),
                    Some(RegionOccluders::new(ground, vec![ground], open_above)),
                );
            }
        }
    }

    storage
}

/// What the non-occlusion stages produced for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameOutput {
    pub light_uploads: u32,
    pub solid_specs: usize,
    pub translucent_specs: usize,
    pub index_slabs: usize,
}

/// Feeds visible regions to the light texture and cluster draw lists.
pub struct SceneFeed {
    lights: HashMap<RegionOrigin, LightRegionData>,
    texture: LightDataTexture,
    index_pool: IndexSlabPool,
}

impl SceneFeed {
    pub fn new(light_capacity: usize) -> Self {
        Self {
            lights: HashMap::new(),
            texture: LightDataTexture::new(light_capacity),
            index_pool: IndexSlabPool::default(),
        }
    }

    /// `backface_flags` holds the faces that can face the camera for each
    /// entry of `visible`.
    pub fn process(
        &mut self,
        storage: &RegionStorage,
        visible: &[RegionId],
        backface_flags: &[FaceFlags],
    ) -> FrameOutput {
        let mut output = FrameOutput {
            light_uploads: self.update_lights(storage, visible),
            ..FrameOutput::default()
        };

        let allocations = pack_geometry(storage, visible, backface_flags);

        let mut solid = RealmDrawList::new(ClusterRealm::Solid);
        let mut translucent = RealmDrawList::new(ClusterRealm::Translucent);
        for cluster in allocations.chunks(CLUSTER_SIZE) {
            let list = solid.push_list();
            cluster.iter().for_each(|&a| list.add(a));

            // translucent geometry is drawn back to front
            let list = translucent.push_list();
            cluster.iter().rev().for_each(|&a| list.add(a));
        }

        solid.build(&mut self.index_pool);
        translucent.build(&mut self.index_pool);

        output.solid_specs = solid.specs().count();
        output.translucent_specs = translucent.specs().count();
        output.index_slabs = solid.index_slabs().len() + translucent.index_slabs().len();

        solid.release(&mut self.index_pool);
        translucent.release(&mut self.index_pool);
        output
    }

    /// Put a torch on top of every visible ground slab and upload what changed.
    fn update_lights(&mut self, storage: &RegionStorage, visible: &[RegionId]) -> u32 {
        let mut uploads = 0;

        for region in visible.iter().filter_map(|&id| storage.region(id)) {
            let Some(occluders) = region.occluders() else {
                continue;
            };
            let ground = occluders.bounds();
            if ground.y1() >= REGION_SIZE {
                continue;
            }

            let origin = region.origin();
            let data = self.lights.entry(origin).or_insert_with(|| {
                let mut data = LightRegionData::new(origin);
                let torch = Light::encode(15, 11, 6, true, false);
                if let Err(e) = data.put_at(origin.x + 8, origin.y + ground.y1(), origin.z + 8, torch) {
                    warn!("Couldn't place torch in {origin:?}: {e}");
                }
                data
            });

            match self.texture.upload(data) {
                Ok(true) => uploads += 1,
                Ok(false) => {}
                Err(e) => warn!("Light upload failed for {origin:?}: {e}"),
            }
        }

        debug!("Light texture holds {} of {} regions", self.texture.len(), self.texture.capacity());
        uploads
    }
}

/// Lay out one quad per box face that can face the camera for each visible
/// region in shared vertex slabs.
fn pack_geometry(
    storage: &RegionStorage,
    visible: &[RegionId],
    backface_flags: &[FaceFlags],
) -> Vec<SlabAllocation> {
    let mut slabs = vec![VertexSlab::new(SlabId(0), MAX_SLAB_QUAD_VERTEX_COUNT)];
    let mut allocations = Vec::with_capacity(visible.len());

    for (&id, faces) in visible.iter().zip(backface_flags) {
        let Some(occluders) = storage.region(id).and_then(|r| r.occluders()) else {
            continue;
        };

        let quad_vertex_count = occluders.boxes().len() as u32 * faces.bits().count_ones() * QUAD_VERTICES;
        if quad_vertex_count == 0 {
            continue;
        }

        let allocation = match slabs.last_mut().and_then(|s| s.allocate(quad_vertex_count)) {
            Some(a) => a,
            None => {
                let mut slab = VertexSlab::new(SlabId(slabs.len() as u32), MAX_SLAB_QUAD_VERTEX_COUNT);
                let Some(a) = slab.allocate(quad_vertex_count) else {
                    continue;
                };
                slabs.push(slab);
                a
            }
        };
        allocations.push(allocation);
    }

    allocations
}

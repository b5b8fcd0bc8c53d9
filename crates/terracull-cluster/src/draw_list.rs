//! Per-cluster draw lists.
//!
//! A cluster draw list collects the slab allocations of visible regions and
//! turns them into draw specs: one bind of a vertex slab and an index slab
//! plus one indexed draw call each.

use hashbrown::HashMap;

use crate::index_slab::{IndexSlab, IndexSlabId, IndexSlabPool, INDEX_QUAD_VERTEX_TO_TRIANGLE_BYTES_MULTIPLIER};
use crate::slab::{SlabAllocation, SlabId, QUAD_VERTICES};

/// Which draw strategy a cluster uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterRealm {
    /// Order independent. Regions sharing a slab are merged into one call.
    Solid,
    /// Regions must be drawn in the given order. Calls are split whenever
    /// the slab changes.
    Translucent,
}

/// One indexed draw call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawSpec {
    pub slab: SlabId,
    pub index_slab: IndexSlabId,
    pub tri_vertex_count: u32,
    pub index_base_byte_address: u32,
}

#[derive(Debug)]
pub struct ClusterDrawList {
    realm: ClusterRealm,
    regions: Vec<SlabAllocation>,
    specs: Vec<DrawSpec>,
}

impl ClusterDrawList {
    pub fn new(realm: ClusterRealm) -> Self {
        Self {
            realm,
            regions: Vec::new(),
            specs: Vec::new(),
        }
    }

    pub const fn realm(&self) -> ClusterRealm {
        self.realm
    }

    /// Append a region in draw order.
    pub fn add(&mut self, region: SlabAllocation) {
        self.regions.push(region);
    }

    pub fn regions(&self) -> &[SlabAllocation] {
        &self.regions
    }

    pub fn specs(&self) -> &[DrawSpec] {
        &self.specs
    }

    /// Build draw specs, loading indices into `index_slabs`.
    ///
    /// The last slab in `index_slabs` is filled first; new slabs are claimed
    /// from `pool` and appended when it runs out of room. Specs that cannot
    /// get an index slab are dropped.
    pub fn build(&mut self, pool: &mut IndexSlabPool, index_slabs: &mut Vec<IndexSlab>) {
        debug_assert!(self.specs.is_empty());

        match self.realm {
            ClusterRealm::Solid => self.build_solid(pool, index_slabs),
            ClusterRealm::Translucent => self.build_translucent(pool, index_slabs),
        }
    }

    /// Keeps region order at the cost of extra binds and calls.
    fn build_translucent(&mut self, pool: &mut IndexSlabPool, index_slabs: &mut Vec<IndexSlab>) {
        let mut spec_regions: Vec<SlabAllocation> = Vec::new();
        let mut spec_quad_vertex_count = 0;
        let mut last_slab = None;

        for &region in &self.regions {
            if last_slab != Some(region.slab) {
                add_spec(&mut self.specs, pool, index_slabs, &spec_regions, spec_quad_vertex_count);
                spec_regions.clear();
                spec_quad_vertex_count = 0;
                last_slab = Some(region.slab);
            }

            spec_regions.push(region);
            spec_quad_vertex_count += region.quad_vertex_count;
        }

        add_spec(&mut self.specs, pool, index_slabs, &spec_regions, spec_quad_vertex_count);
    }

    /// Minimizes binds and calls. Groups keep the order their slab was first seen.
    fn build_solid(&mut self, pool: &mut IndexSlabPool, index_slabs: &mut Vec<IndexSlab>) {
        let mut group_of: HashMap<SlabId, usize> = HashMap::new();
        let mut groups: Vec<(Vec<SlabAllocation>, u32)> = Vec::new();

        for &region in &self.regions {
            let i = *group_of.entry(region.slab).or_insert_with(|| {
                groups.push((Vec::new(), 0));
                groups.len() - 1
            });
            groups[i].0.push(region);
            groups[i].1 += region.quad_vertex_count;
        }

        for (regions, quad_vertex_count) in &groups {
            debug_assert!(*quad_vertex_count <= pool.quad_vertex_capacity());
            add_spec(&mut self.specs, pool, index_slabs, regions, *quad_vertex_count);
        }
    }

    /// Drop regions and specs. Index slabs are owned by the caller.
    pub fn clear(&mut self) {
        self.regions.clear();
        self.specs.clear();
    }
}

fn add_spec(
    specs: &mut Vec<DrawSpec>,
    pool: &mut IndexSlabPool,
    index_slabs: &mut Vec<IndexSlab>,
    regions: &[SlabAllocation],
    quad_vertex_count: u32,
) {
    if quad_vertex_count == 0 {
        return;
    }

    debug_assert!(!regions.is_empty(), "Vertex count is non-zero but region list is empty");

    let needs_slab = index_slabs
        .last()
        .map_or(true, |s| s.available_quad_vertex_count() < quad_vertex_count);

    if needs_slab {
        let Some(slab) = pool.claim() else {
            return;
        };
        index_slabs.push(slab);
    }

    let Some(index_slab) = index_slabs.last_mut() else {
        return;
    };

    let byte_offset = index_slab.next_byte_offset();
    let slab = regions[0].slab;

    for region in regions {
        debug_assert_eq!(region.slab, slab, "Regions in one draw spec must share a slab");
        index_slab.allocate_and_load(region.base_quad_vertex_index, region.quad_vertex_count);
    }

    debug_assert_eq!(
        byte_offset + quad_vertex_count * INDEX_QUAD_VERTEX_TO_TRIANGLE_BYTES_MULTIPLIER,
        index_slab.next_byte_offset()
    );

    specs.push(DrawSpec {
        slab,
        index_slab: index_slab.id(),
        tri_vertex_count: quad_vertex_count / QUAD_VERTICES * 6,
        index_base_byte_address: byte_offset,
    });
}

/// Draw lists of one realm plus the index slabs they reference.
#[derive(Debug)]
pub struct RealmDrawList {
    realm: ClusterRealm,
    lists: Vec<ClusterDrawList>,
    index_slabs: Vec<IndexSlab>,
}

impl RealmDrawList {
    pub fn new(realm: ClusterRealm) -> Self {
        Self {
            realm,
            lists: Vec::new(),
            index_slabs: Vec::new(),
        }
    }

    /// New empty cluster list, returned for filling.
    pub fn push_list(&mut self) -> &mut ClusterDrawList {
        self.lists.push(ClusterDrawList::new(self.realm));
        let last = self.lists.len() - 1;
        &mut self.lists[last]
    }

    pub fn build(&mut self, pool: &mut IndexSlabPool) {
        for list in &mut self.lists {
            list.build(pool, &mut self.index_slabs);
        }
    }

    /// Every draw spec in submission order.
    pub fn specs(&self) -> impl Iterator<Item = &DrawSpec> {
        self.lists.iter().flat_map(|l| l.specs().iter())
    }

    pub fn index_slabs(&self) -> &[IndexSlab] {
        &self.index_slabs
    }

    /// Return all index slabs to the pool and drop the lists.
    pub fn release(&mut self, pool: &mut IndexSlabPool) {
        for slab in self.index_slabs.drain(..) {
            pool.release(slab);
        }
        self.lists.clear();
    }
}

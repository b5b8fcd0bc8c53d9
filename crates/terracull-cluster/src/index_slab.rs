//! Triangle index buffers for quad geometry.
//!
//! Each quad `v0 v1 v2 v3` becomes two triangles `v0 v1 v2` and `v2 v3 v0`,
//! six 16-bit indices per four quad vertices.

use tracing::warn;

use crate::slab::{MAX_SLAB_QUAD_VERTEX_COUNT, QUAD_VERTICES};

/// Index bytes per quad vertex: six two-byte indices per four vertices.
pub const INDEX_QUAD_VERTEX_TO_TRIANGLE_BYTES_MULTIPLIER: u32 = 3;

/// Default quad vertex capacity of one index slab.
pub const MAX_INDEX_SLAB_QUAD_VERTEX_COUNT: u32 = MAX_SLAB_QUAD_VERTEX_COUNT;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexSlabId(pub u32);

#[derive(Debug)]
pub struct IndexSlab {
    id: IndexSlabId,
    capacity: u32,
    indices: Vec<u16>,
}

impl IndexSlab {
    pub fn new(id: IndexSlabId, quad_vertex_capacity: u32) -> Self {
        debug_assert!(quad_vertex_capacity % QUAD_VERTICES == 0);
        Self {
            id,
            capacity: quad_vertex_capacity,
            indices: Vec::with_capacity((quad_vertex_capacity / QUAD_VERTICES * 6) as usize),
        }
    }

    pub const fn id(&self) -> IndexSlabId {
        self.id
    }

    /// Quad vertices already indexed.
    pub fn used_quad_vertex_count(&self) -> u32 {
        self.indices.len() as u32 / 6 * QUAD_VERTICES
    }

    pub fn available_quad_vertex_count(&self) -> u32 {
        self.capacity - self.used_quad_vertex_count()
    }

    /// Byte offset where the next load will start.
    pub fn next_byte_offset(&self) -> u32 {
        self.used_quad_vertex_count() * INDEX_QUAD_VERTEX_TO_TRIANGLE_BYTES_MULTIPLIER
    }

    /// Append triangle indices for `quad_vertex_count` vertices starting at
    /// `base_quad_vertex_index` in the vertex slab.
    pub fn allocate_and_load(&mut self, base_quad_vertex_index: u32, quad_vertex_count: u32) {
        debug_assert!(quad_vertex_count % QUAD_VERTICES == 0);
        debug_assert!(quad_vertex_count <= self.available_quad_vertex_count());
        debug_assert!(base_quad_vertex_index + quad_vertex_count <= MAX_SLAB_QUAD_VERTEX_COUNT);

        for quad in 0..quad_vertex_count / QUAD_VERTICES {
            let v0 = (base_quad_vertex_index + quad * QUAD_VERTICES) as u16;
            self.indices
                .extend_from_slice(&[v0, v0 + 1, v0 + 2, v0 + 2, v0 + 3, v0]);
        }
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Index data for upload.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }
}

/// Bounded set of reusable index slabs.
#[derive(Debug)]
pub struct IndexSlabPool {
    quad_vertex_capacity: u32,
    max_slabs: usize,
    created: usize,
    free: Vec<IndexSlab>,
}

impl IndexSlabPool {
    pub fn new(max_slabs: usize, quad_vertex_capacity: u32) -> Self {
        Self {
            quad_vertex_capacity,
            max_slabs,
            created: 0,
            free: Vec::new(),
        }
    }

    pub const fn quad_vertex_capacity(&self) -> u32 {
        self.quad_vertex_capacity
    }

    /// Slabs currently handed out.
    pub fn claimed(&self) -> usize {
        self.created - self.free.len()
    }

    /// An empty slab, or `None` when the pool is exhausted.
    pub fn claim(&mut self) -> Option<IndexSlab> {
        if let Some(slab) = self.free.pop() {
            return Some(slab);
        }

        if self.created >= self.max_slabs {
            warn!("Index slab pool exhausted ({} slabs)", self.max_slabs);
            return None;
        }

        let id = IndexSlabId(self.created as u32);
        self.created += 1;
        Some(IndexSlab::new(id, self.quad_vertex_capacity))
    }

    pub fn release(&mut self, mut slab: IndexSlab) {
        slab.clear();
        self.free.push(slab);
    }
}

impl Default for IndexSlabPool {
    fn default() -> Self {
        Self::new(64, MAX_INDEX_SLAB_QUAD_VERTEX_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quads_become_two_triangles() {
        let mut slab = IndexSlab::new(IndexSlabId(0), 64);
        slab.allocate_and_load(4, 8);

        assert_eq!(slab.indices(), &[4, 5, 6, 6, 7, 4, 8, 9, 10, 10, 11, 8]);
        assert_eq!(slab.next_byte_offset(), 24);
        assert_eq!(slab.bytes().len(), 24);
        assert_eq!(slab.available_quad_vertex_count(), 56);
    }

    #[test]
    fn pool_is_bounded_and_recycles() {
        let mut pool = IndexSlabPool::new(1, 16);
        let mut slab = pool.claim().unwrap();
        assert!(pool.claim().is_none());

        slab.allocate_and_load(0, 4);
        pool.release(slab);
        assert_eq!(pool.claimed(), 0);

        let slab = pool.claim().unwrap();
        assert_eq!(slab.next_byte_offset(), 0);
        assert_eq!(pool.claimed(), 1);
    }
}

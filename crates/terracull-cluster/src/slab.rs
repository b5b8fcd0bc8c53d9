//! Vertex slabs shared by the regions of a cluster.

/// Vertices per quad.
pub const QUAD_VERTICES: u32 = 4;

/// Largest slab addressable with 16-bit triangle indices.
pub const MAX_SLAB_QUAD_VERTEX_COUNT: u32 = 0x1_0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlabId(pub u32);

/// Quad vertices of one region inside a vertex slab.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlabAllocation {
    pub slab: SlabId,
    pub base_quad_vertex_index: u32,
    pub quad_vertex_count: u32,
}

impl SlabAllocation {
    /// Triangle vertices needed to draw the quads.
    pub const fn tri_vertex_count(&self) -> u32 {
        self.quad_vertex_count / QUAD_VERTICES * 6
    }
}

/// Bump allocator over a fixed span of quad vertices.
#[derive(Debug)]
pub struct VertexSlab {
    id: SlabId,
    capacity: u32,
    head: u32,
}

impl VertexSlab {
    pub fn new(id: SlabId, capacity: u32) -> Self {
        debug_assert!(capacity <= MAX_SLAB_QUAD_VERTEX_COUNT);
        Self { id, capacity, head: 0 }
    }

    pub const fn id(&self) -> SlabId {
        self.id
    }

    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    pub const fn used_quad_vertex_count(&self) -> u32 {
        self.head
    }

    pub const fn available_quad_vertex_count(&self) -> u32 {
        self.capacity - self.head
    }

    /// Reserve space for `quad_vertex_count` vertices, a multiple of four.
    pub fn allocate(&mut self, quad_vertex_count: u32) -> Option<SlabAllocation> {
        debug_assert!(quad_vertex_count % QUAD_VERTICES == 0);

        if quad_vertex_count > self.available_quad_vertex_count() {
            return None;
        }

        let base = self.head;
        self.head += quad_vertex_count;
        Some(SlabAllocation {
            slab: self.id,
            base_quad_vertex_index: base,
            quad_vertex_count,
        })
    }

    pub fn clear(&mut self) {
        self.head = 0;
    }
}

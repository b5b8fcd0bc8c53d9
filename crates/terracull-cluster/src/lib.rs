//! Cluster draw-list assembly.
//!
//! Region geometry lives in shared vertex slabs. For each cluster of visible
//! regions this crate produces draw specs that bind one vertex slab and one
//! index slab per indexed draw call.

pub mod draw_list;
pub mod index_slab;
pub mod slab;

pub use draw_list::{ClusterDrawList, ClusterRealm, DrawSpec, RealmDrawList};
pub use index_slab::{IndexSlab, IndexSlabId, IndexSlabPool, MAX_INDEX_SLAB_QUAD_VERTEX_COUNT};
pub use slab::{SlabAllocation, SlabId, VertexSlab, MAX_SLAB_QUAD_VERTEX_COUNT, QUAD_VERTICES};

//! Fixed-capacity light texture holding many regions.
//!
//! Each live light region owns one slot of [`REGION_BYTES`] in a staging
//! buffer that mirrors the GPU texture. Dirty regions are copied into their
//! slot on upload.

use hashbrown::HashMap;
use terracull_core::constants::REGION_SIZE_CUBED;
use terracull_core::{RegionOrigin, Result};
use tracing::{debug, warn};

use crate::encoding::Light;
use crate::region_data::{LightRegionData, REGION_BYTES};

/// Index of a region slot in the light texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LightSlot(u32);

impl LightSlot {
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Byte offset of the slot in the texture.
    pub const fn byte_offset(self) -> usize {
        self.index() * REGION_BYTES
    }
}

pub struct LightDataTexture {
    capacity: usize,
    staging: Box<[Light]>,
    by_origin: HashMap<RegionOrigin, LightSlot>,
    free: Vec<LightSlot>,
}

impl LightDataTexture {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            staging: vec![Light::DARK; capacity * REGION_SIZE_CUBED].into_boxed_slice(),
            by_origin: HashMap::new(),
            // lowest slots handed out first
            free: (0..capacity as u32).rev().map(LightSlot).collect(),
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of allocated slots.
    pub fn len(&self) -> usize {
        self.by_origin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_origin.is_empty()
    }

    pub fn slot(&self, origin: RegionOrigin) -> Option<LightSlot> {
        self.by_origin.get(&origin).copied()
    }

    /// Slot for `origin`, allocating one if needed.
    ///
    /// Returns `None` when every slot is taken; the region then goes unlit.
    pub fn allocate(&mut self, origin: RegionOrigin) -> Option<LightSlot> {
        if let Some(slot) = self.slot(origin) {
            return Some(slot);
        }

        let Some(slot) = self.free.pop() else {
            warn!(
                "Light texture full ({} regions), dropping light region {:?}",
                self.capacity, origin
            );
            return None;
        };

        self.by_origin.insert(origin, slot);
        debug!("Allocated light slot {} for {:?}", slot.index(), origin);
        Some(slot)
    }

    /// Free the slot of `origin`, clearing its texels.
    pub fn release(&mut self, origin: RegionOrigin) -> bool {
        let Some(slot) = self.by_origin.remove(&origin) else {
            return false;
        };

        self.slot_texels_mut(slot).fill(Light::DARK);
        self.free.push(slot);
        true
    }

    fn slot_texels_mut(&mut self, slot: LightSlot) -> &mut [Light] {
        let start = slot.index() * REGION_SIZE_CUBED;
        &mut self.staging[start..start + REGION_SIZE_CUBED]
    }

    /// Copy a dirty region into its slot and clear its dirty flag.
    ///
    /// Returns `Ok(false)` when the region is clean or has no slot.
    pub fn upload(&mut self, data: &mut LightRegionData) -> Result<bool> {
        if !data.is_dirty() {
            return Ok(false);
        }

        let Some(slot) = self.allocate(data.origin()) else {
            return Ok(false);
        };

        let bytes = data.bytes()?;
        let dst: &mut [u8] = bytemuck::cast_slice_mut(self.slot_texels_mut(slot));
        dst.copy_from_slice(bytes);
        data.clear_dirty();
        Ok(true)
    }

    /// Whole staging buffer as texture bytes.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.staging)
    }
}

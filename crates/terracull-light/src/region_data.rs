//! Light texels of one 16^3 region.

use glam::IVec3;
use terracull_core::constants::{REGION_BITS, REGION_MASK, REGION_SIZE, REGION_SIZE_CUBED};
use terracull_core::{Error, RegionOrigin, Result};

use crate::encoding::Light;

/// Bytes per texel in the light texture.
pub const PIXEL_BYTES: usize = std::mem::size_of::<Light>();

/// Byte size of one region's texels.
pub const REGION_BYTES: usize = REGION_SIZE_CUBED * PIXEL_BYTES;

/// Light data for one region, laid out for upload as a 3D texture.
///
/// Texels are ordered Z-major, then Y, then X, so X is the fastest axis.
/// Indices are byte offsets into that layout.
#[derive(Debug)]
pub struct LightRegionData {
    origin: RegionOrigin,
    texels: Option<Box<[Light]>>,
    dirty: bool,
}

impl LightRegionData {
    /// New all-dark region. Starts dirty so it is uploaded at least once.
    pub fn new(origin: RegionOrigin) -> Self {
        Self {
            origin,
            texels: Some(vec![Light::DARK; REGION_SIZE_CUBED].into_boxed_slice()),
            dirty: true,
        }
    }

    pub const fn origin(&self) -> RegionOrigin {
        self.origin
    }

    /// Byte index of a world block position. The position must be within extents.
    #[inline]
    pub const fn indexify(&self, x: i32, y: i32, z: i32) -> usize {
        debug_assert!(self.within_extents(x, y, z), "block outside light region");
        let local_x = x - self.origin.x;
        let local_y = y - self.origin.y;
        let local_z = z - self.origin.z;
        (((local_z << (REGION_BITS * 2)) | (local_y << REGION_BITS) | local_x) as usize) * PIXEL_BYTES
    }

    /// World block position of a byte index.
    #[inline]
    pub const fn reverse_indexify(&self, index: usize) -> IVec3 {
        let texel = (index / PIXEL_BYTES) as i32;
        IVec3::new(
            (texel & REGION_MASK) + self.origin.x,
            ((texel >> REGION_BITS) & REGION_MASK) + self.origin.y,
            ((texel >> (REGION_BITS * 2)) & REGION_MASK) + self.origin.z,
        )
    }

    pub const fn within_extents(&self, x: i32, y: i32, z: i32) -> bool {
        x >= self.origin.x
            && x < self.origin.x + REGION_SIZE
            && y >= self.origin.y
            && y < self.origin.y + REGION_SIZE
            && z >= self.origin.z
            && z < self.origin.z + REGION_SIZE
    }

    fn texel_index(&self, index: usize) -> Result<usize> {
        if index % PIXEL_BYTES != 0 || index >= REGION_BYTES {
            return Err(Error::OutOfBounds(format!(
                "light byte index {index} in region {:?}",
                self.origin
            )));
        }
        Ok(index / PIXEL_BYTES)
    }

    fn closed_error(&self) -> Error {
        Error::Closed(format!("light region {:?}", self.origin))
    }

    /// Texel at a byte index.
    pub fn get(&self, index: usize) -> Result<Light> {
        let i = self.texel_index(index)?;
        let texels = self.texels.as_ref().ok_or_else(|| self.closed_error())?;
        Ok(texels[i])
    }

    /// Store a texel at a byte index. Does not mark the region dirty.
    pub fn put(&mut self, index: usize, light: Light) -> Result<()> {
        let i = self.texel_index(index)?;
        let origin = self.origin;
        let texels = self
            .texels
            .as_mut()
            .ok_or_else(|| Error::Closed(format!("light region {origin:?}")))?;
        texels[i] = light;
        Ok(())
    }

    /// Texel at a world block position.
    pub fn get_at(&self, x: i32, y: i32, z: i32) -> Result<Light> {
        if !self.within_extents(x, y, z) {
            return Err(Error::OutOfBounds(format!("block ({x}, {y}, {z})")));
        }
        self.get(self.indexify(x, y, z))
    }

    /// Store a texel at a world block position and mark the region dirty.
    pub fn put_at(&mut self, x: i32, y: i32, z: i32, light: Light) -> Result<()> {
        if !self.within_extents(x, y, z) {
            return Err(Error::OutOfBounds(format!("block ({x}, {y}, {z})")));
        }
        self.put(self.indexify(x, y, z), light)?;
        self.dirty = true;
        Ok(())
    }

    /// Raw texture bytes for upload.
    pub fn bytes(&self) -> Result<&[u8]> {
        self.texels
            .as_deref()
            .map(bytemuck::cast_slice)
            .ok_or_else(|| self.closed_error())
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Release the texel storage. Further access fails with [`Error::Closed`].
    pub fn close(&mut self) {
        self.texels = None;
    }

    pub const fn is_closed(&self) -> bool {
        self.texels.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> LightRegionData {
        LightRegionData::new(RegionOrigin::containing(-32, 64, 16))
    }

    #[test]
    fn index_roundtrip_over_region() {
        let data = region();
        let o = data.origin();
        let mut expected = 0;
        for z in 0..REGION_SIZE {
            for y in 0..REGION_SIZE {
                for x in 0..REGION_SIZE {
                    let pos = IVec3::new(o.x + x, o.y + y, o.z + z);
                    let index = data.indexify(pos.x, pos.y, pos.z);
                    assert_eq!(index, expected, "{pos}");
                    assert!(index < REGION_BYTES);
                    assert_eq!(index % PIXEL_BYTES, 0);
                    assert_eq!(data.reverse_indexify(index), pos);
                    expected += PIXEL_BYTES;
                }
            }
        }
        assert_eq!(expected, REGION_BYTES);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "block outside light region")]
    fn indexify_outside_extents_panics_in_debug() {
        let data = region();
        let o = data.origin();
        let _ = data.indexify(o.x + REGION_SIZE, o.y, o.z);
    }

    #[test]
    fn x_is_fastest_axis() {
        let data = region();
        let o = data.origin();
        assert_eq!(data.indexify(o.x, o.y, o.z), 0);
        assert_eq!(data.indexify(o.x + 1, o.y, o.z), PIXEL_BYTES);
        assert_eq!(data.indexify(o.x, o.y + 1, o.z), 16 * PIXEL_BYTES);
        assert_eq!(data.indexify(o.x, o.y, o.z + 1), 256 * PIXEL_BYTES);
        assert_eq!(data.indexify(o.x + 15, o.y + 15, o.z + 15), REGION_BYTES - PIXEL_BYTES);
    }

    #[test]
    fn extents_are_half_open() {
        let data = region();
        let o = data.origin();
        assert!(data.within_extents(o.x, o.y, o.z));
        assert!(data.within_extents(o.x + 15, o.y + 15, o.z + 15));
        assert!(!data.within_extents(o.x + 16, o.y, o.z));
        assert!(!data.within_extents(o.x, o.y - 1, o.z));
    }

    #[test]
    fn put_get_and_dirty() {
        let mut data = region();
        let o = data.origin();
        data.clear_dirty();

        let light = Light::encode(9, 0, 4, true, false);
        data.put_at(o.x + 2, o.y + 3, o.z + 4, light).unwrap();
        assert!(data.is_dirty());
        assert_eq!(data.get_at(o.x + 2, o.y + 3, o.z + 4).unwrap(), light);

        let index = data.indexify(o.x + 2, o.y + 3, o.z + 4);
        let bytes = data.bytes().unwrap();
        assert_eq!(u16::from_ne_bytes([bytes[index], bytes[index + 1]]), light.0);
    }

    #[test]
    fn bad_indices_are_rejected() {
        let mut data = region();
        assert!(matches!(data.get(REGION_BYTES), Err(Error::OutOfBounds(_))));
        assert!(matches!(data.get(1), Err(Error::OutOfBounds(_))));
        assert!(matches!(data.get_at(0, 0, 0), Err(Error::OutOfBounds(_))));
        assert!(data.put(REGION_BYTES - PIXEL_BYTES, Light::DARK).is_ok());
    }

    #[test]
    fn closed_region_refuses_access() {
        let mut data = region();
        data.close();
        assert!(data.is_closed());
        assert!(matches!(data.get(0), Err(Error::Closed(_))));
        assert!(matches!(data.put(0, Light::DARK), Err(Error::Closed(_))));
        assert!(data.bytes().is_err());
    }
}

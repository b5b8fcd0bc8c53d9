//! Region coordinates.

use crate::constants::{REGION_BITS, REGION_MASK, REGION_SIZE};
use crate::face::Face;
use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};

/// Minimum block corner of a render region.
///
/// Always aligned to [`REGION_SIZE`] on every axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionOrigin {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl RegionOrigin {
    /// Origin of the region containing the given block.
    #[inline]
    pub const fn containing(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: x & !REGION_MASK,
            y: y & !REGION_MASK,
            z: z & !REGION_MASK,
        }
    }

    /// Origin of the region at the given chunk coordinates.
    #[inline]
    pub const fn from_chunk(chunk: IVec3) -> Self {
        Self {
            x: chunk.x << REGION_BITS,
            y: chunk.y << REGION_BITS,
            z: chunk.z << REGION_BITS,
        }
    }

    /// Origin of the region containing a world-space point.
    pub fn containing_point(pos: DVec3) -> Self {
        Self::containing(
            pos.x.floor() as i32,
            pos.y.floor() as i32,
            pos.z.floor() as i32,
        )
    }

    /// Chunk coordinates of this region.
    #[inline]
    pub const fn chunk(self) -> IVec3 {
        IVec3::new(
            self.x >> REGION_BITS,
            self.y >> REGION_BITS,
            self.z >> REGION_BITS,
        )
    }

    /// Origin of the adjacent region across the given face.
    #[inline]
    pub fn neighbor(self, face: Face) -> Self {
        let step = face.offset() * REGION_SIZE;
        Self {
            x: self.x + step.x,
            y: self.y + step.y,
            z: self.z + step.z,
        }
    }

    /// Squared distance in chunks between this region and the chunk holding the camera.
    #[inline]
    pub fn squared_chunk_distance(self, camera_chunk: IVec3) -> i32 {
        let d = self.chunk() - camera_chunk;
        d.x * d.x + d.y * d.y + d.z * d.z
    }

    /// Squared block distance from the region center to a world-space point.
    pub fn squared_block_distance(self, pos: DVec3) -> i32 {
        let half = f64::from(REGION_SIZE) * 0.5;
        let center = DVec3::new(
            f64::from(self.x) + half,
            f64::from(self.y) + half,
            f64::from(self.z) + half,
        );
        let d = center.distance_squared(pos);
        if d >= f64::from(i32::MAX) {
            i32::MAX
        } else {
            d as i32
        }
    }

    /// Convert to glam IVec3
    #[inline]
    pub const fn to_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }
}

impl From<IVec3> for RegionOrigin {
    fn from(v: IVec3) -> Self {
        Self::containing(v.x, v.y, v.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_aligns_down() {
        assert_eq!(RegionOrigin::containing(17, 0, 31), RegionOrigin { x: 16, y: 0, z: 16 });
        assert_eq!(
            RegionOrigin::containing(-1, -16, -17),
            RegionOrigin { x: -16, y: -16, z: -32 }
        );
    }

    #[test]
    fn chunk_roundtrip() {
        let origin = RegionOrigin::containing(-40, 70, 129);
        assert_eq!(RegionOrigin::from_chunk(origin.chunk()), origin);
    }

    #[test]
    fn neighbors_are_one_region_apart() {
        let origin = RegionOrigin::containing(0, 0, 0);
        for face in Face::ALL {
            let n = origin.neighbor(face);
            assert_eq!(n.squared_chunk_distance(origin.chunk()), 1);
            assert_eq!(n.neighbor(face.opposite()), origin);
        }
    }

    #[test]
    fn block_distance_from_center() {
        let origin = RegionOrigin::containing(0, 0, 0);
        assert_eq!(origin.squared_block_distance(DVec3::splat(8.0)), 0);
        assert_eq!(origin.squared_block_distance(DVec3::new(18.0, 8.0, 8.0)), 100);
    }
}

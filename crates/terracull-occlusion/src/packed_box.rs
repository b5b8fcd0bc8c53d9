//! Region-local bounding boxes packed into 32 bits.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

const COORD_BITS: u32 = 5;
const COORD_MASK: u32 = (1 << COORD_BITS) - 1;
const X0_SHIFT: u32 = 0;
const Y0_SHIFT: u32 = 5;
const Z0_SHIFT: u32 = 10;
const X1_SHIFT: u32 = 15;
const Y1_SHIFT: u32 = 20;
const Z1_SHIFT: u32 = 25;
const RANGE_SHIFT: u32 = 30;

/// Squared block distances separating the occlusion range tiers.
const NEAR_SQ_DIST: i32 = 64 * 64;
const MID_SQ_DIST: i32 = 128 * 128;
const FAR_SQ_DIST: i32 = 256 * 256;

/// Level-of-detail tier of an occluding box.
///
/// A box is worth drawing as an occluder for regions whose occlusion range
/// is no higher than the box's own range. Large boxes carry `Extreme` and are
/// drawn at every distance; small boxes only matter up close.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OcclusionRange {
    Near = 0,
    Mid = 1,
    Far = 2,
    Extreme = 3,
}

impl OcclusionRange {
    #[inline]
    const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Self::Near,
            1 => Self::Mid,
            2 => Self::Far,
            _ => Self::Extreme,
        }
    }

    /// Occlusion range of a region at the given squared block distance from the camera.
    #[must_use]
    pub const fn from_squared_block_distance(squared_dist: i32) -> Self {
        if squared_dist < NEAR_SQ_DIST {
            Self::Near
        } else if squared_dist < MID_SQ_DIST {
            Self::Mid
        } else if squared_dist < FAR_SQ_DIST {
            Self::Far
        } else {
            Self::Extreme
        }
    }
}

/// Bounding box in region-local block units (`0..=16` per axis) plus range tier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct PackedBox(pub u32);

impl PackedBox {
    /// The whole 16^3 region, drawn at every distance.
    pub const FULL_BOX: Self = Self::new(0, 0, 0, 16, 16, 16, OcclusionRange::Extreme);

    /// Pack a box. Coordinates must be in `0..=16` with min <= max on every axis.
    #[inline]
    #[must_use]
    pub const fn new(
        x0: u32,
        y0: u32,
        z0: u32,
        x1: u32,
        y1: u32,
        z1: u32,
        range: OcclusionRange,
    ) -> Self {
        debug_assert!(x1 <= 16 && y1 <= 16 && z1 <= 16);
        debug_assert!(x0 <= x1 && y0 <= y1 && z0 <= z1);
        Self(
            (x0 << X0_SHIFT)
                | (y0 << Y0_SHIFT)
                | (z0 << Z0_SHIFT)
                | (x1 << X1_SHIFT)
                | (y1 << Y1_SHIFT)
                | (z1 << Z1_SHIFT)
                | ((range as u32) << RANGE_SHIFT),
        )
    }

    #[inline]
    #[must_use]
    pub const fn x0(self) -> i32 {
        ((self.0 >> X0_SHIFT) & COORD_MASK) as i32
    }

    #[inline]
    #[must_use]
    pub const fn y0(self) -> i32 {
        ((self.0 >> Y0_SHIFT) & COORD_MASK) as i32
    }

    #[inline]
    #[must_use]
    pub const fn z0(self) -> i32 {
        ((self.0 >> Z0_SHIFT) & COORD_MASK) as i32
    }

    #[inline]
    #[must_use]
    pub const fn x1(self) -> i32 {
        ((self.0 >> X1_SHIFT) & COORD_MASK) as i32
    }

    #[inline]
    #[must_use]
    pub const fn y1(self) -> i32 {
        ((self.0 >> Y1_SHIFT) & COORD_MASK) as i32
    }

    #[inline]
    #[must_use]
    pub const fn z1(self) -> i32 {
        ((self.0 >> Z1_SHIFT) & COORD_MASK) as i32
    }

    #[inline]
    #[must_use]
    pub const fn range(self) -> OcclusionRange {
        OcclusionRange::from_bits(self.0 >> RANGE_SHIFT)
    }

    /// Number of blocks enclosed.
    #[must_use]
    pub const fn volume(self) -> i32 {
        (self.x1() - self.x0()) * (self.y1() - self.y0()) * (self.z1() - self.z0())
    }
}

impl std::fmt::Debug for PackedBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PackedBox({}, {}, {} -> {}, {}, {} @ {:?})",
            self.x0(),
            self.y0(),
            self.z0(),
            self.x1(),
            self.y1(),
            self.z1(),
            self.range()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_unpack() {
        let b = PackedBox::new(1, 2, 3, 14, 15, 16, OcclusionRange::Far);
        assert_eq!((b.x0(), b.y0(), b.z0()), (1, 2, 3));
        assert_eq!((b.x1(), b.y1(), b.z1()), (14, 15, 16));
        assert_eq!(b.range(), OcclusionRange::Far);
        assert_eq!(b.volume(), 13 * 13 * 13);
    }

    #[test]
    fn full_box_spans_region() {
        let b = PackedBox::FULL_BOX;
        assert_eq!((b.x0(), b.y0(), b.z0()), (0, 0, 0));
        assert_eq!((b.x1(), b.y1(), b.z1()), (16, 16, 16));
        assert_eq!(b.range(), OcclusionRange::Extreme);
    }

    #[test]
    fn range_tiers_increase_with_distance() {
        assert_eq!(OcclusionRange::from_squared_block_distance(0), OcclusionRange::Near);
        assert_eq!(
            OcclusionRange::from_squared_block_distance(100 * 100),
            OcclusionRange::Mid
        );
        assert_eq!(
            OcclusionRange::from_squared_block_distance(200 * 200),
            OcclusionRange::Far
        );
        assert_eq!(
            OcclusionRange::from_squared_block_distance(i32::MAX),
            OcclusionRange::Extreme
        );
        assert!(OcclusionRange::Near < OcclusionRange::Extreme);
    }
}

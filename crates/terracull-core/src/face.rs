//! Axis-aligned face directions.

use bitflags::bitflags;
use glam::IVec3;
use serde::{Deserialize, Serialize};

/// One of the six axis-aligned directions.
///
/// EAST is +X, UP is +Y and SOUTH is +Z. Discriminants are stable and used
/// as array indices for per-face storage.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Down = 0,
    Up = 1,
    North = 2,
    South = 3,
    West = 4,
    East = 5,
}

impl Face {
    /// All faces in index order.
    pub const ALL: [Self; 6] = [
        Self::Down,
        Self::Up,
        Self::North,
        Self::South,
        Self::West,
        Self::East,
    ];

    /// Index usable for per-face arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Face for the given index, `None` when out of range.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Down),
            1 => Some(Self::Up),
            2 => Some(Self::North),
            3 => Some(Self::South),
            4 => Some(Self::West),
            5 => Some(Self::East),
            _ => None,
        }
    }

    /// The face pointing the other way along the same axis.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }

    /// Unit step in block coordinates.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> IVec3 {
        match self {
            Self::Down => IVec3::new(0, -1, 0),
            Self::Up => IVec3::new(0, 1, 0),
            Self::North => IVec3::new(0, 0, -1),
            Self::South => IVec3::new(0, 0, 1),
            Self::West => IVec3::new(-1, 0, 0),
            Self::East => IVec3::new(1, 0, 0),
        }
    }

    /// Flag for this face in a [`FaceFlags`] set.
    #[inline]
    #[must_use]
    pub const fn flag(self) -> FaceFlags {
        FaceFlags::from_bits_truncate(1 << self as u8)
    }
}

bitflags! {
    /// Set of faces, one bit per [`Face`] index.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FaceFlags: u8 {
        const DOWN  = 0b00_0001;
        const UP    = 0b00_0010;
        const NORTH = 0b00_0100;
        const SOUTH = 0b00_1000;
        const WEST  = 0b01_0000;
        const EAST  = 0b10_0000;
    }
}

impl FaceFlags {
    /// Iterate the faces contained in this set, in index order.
    pub fn faces(self) -> impl Iterator<Item = Face> {
        Face::ALL.into_iter().filter(move |f| self.contains(f.flag()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involution() {
        for face in Face::ALL {
            assert_eq!(face.opposite().opposite(), face);
            assert_eq!(face.offset() + face.opposite().offset(), IVec3::ZERO);
        }
    }

    #[test]
    fn index_roundtrip() {
        for face in Face::ALL {
            assert_eq!(Face::from_index(face.index()), Some(face));
        }
        assert_eq!(Face::from_index(6), None);
    }

    #[test]
    fn flags_match_indices() {
        assert_eq!(Face::Down.flag(), FaceFlags::DOWN);
        assert_eq!(Face::East.flag(), FaceFlags::EAST);

        let set = FaceFlags::UP | FaceFlags::WEST;
        let faces: Vec<_> = set.faces().collect();
        assert_eq!(faces, vec![Face::Up, Face::West]);
    }
}

//! Face-to-face connectivity through the open space of a region.

use terracull_core::{Face, FaceFlags};

/// Symmetric 6x6 matrix of face pairs connected by open space inside a region.
///
/// Bit `a * 6 + b` is set together with bit `b * 6 + a`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MutualFaceFlags(u64);

impl MutualFaceFlags {
    /// No face can be seen from any other.
    pub const EMPTY: Self = Self(0);
    /// Every face can be seen from every other, as in an empty region.
    pub const ALL: Self = Self((1 << 36) - 1);

    #[inline]
    const fn bit(a: Face, b: Face) -> u64 {
        1 << (a as u32 * 6 + b as u32)
    }

    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Mark two faces as connected in both directions.
    #[must_use]
    pub const fn with_connection(self, a: Face, b: Face) -> Self {
        Self(self.0 | Self::bit(a, b) | Self::bit(b, a))
    }

    pub fn connect(&mut self, a: Face, b: Face) {
        *self = self.with_connection(a, b);
    }

    #[inline]
    #[must_use]
    pub const fn is_connected(self, a: Face, b: Face) -> bool {
        self.0 & Self::bit(a, b) != 0
    }

    /// Connect every pair among `faces`, including each face to itself.
    #[must_use]
    pub fn from_connected_set(faces: FaceFlags) -> Self {
        let mut flags = Self::EMPTY;
        for a in faces.faces() {
            for b in faces.faces() {
                flags.connect(a, b);
            }
        }
        flags
    }
}

/// Whether traversal that entered a region through `entry_faces` may leave
/// through `face`.
///
/// An empty entry set marks the region holding the camera, from which every
/// face can be visited.
#[inline]
#[must_use]
pub fn can_visit_face(flags: MutualFaceFlags, entry_faces: FaceFlags, face: Face) -> bool {
    entry_faces.is_empty() || entry_faces.faces().any(|entry| flags.is_connected(entry, face))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connections_are_symmetric() {
        let flags = MutualFaceFlags::EMPTY.with_connection(Face::Up, Face::East);
        assert!(flags.is_connected(Face::Up, Face::East));
        assert!(flags.is_connected(Face::East, Face::Up));
        assert!(!flags.is_connected(Face::Up, Face::West));
    }

    #[test]
    fn all_connects_everything() {
        for a in Face::ALL {
            for b in Face::ALL {
                assert!(MutualFaceFlags::ALL.is_connected(a, b));
            }
        }
    }

    #[test]
    fn camera_region_visits_every_face() {
        for face in Face::ALL {
            assert!(can_visit_face(MutualFaceFlags::EMPTY, FaceFlags::empty(), face));
        }
    }

    #[test]
    fn entry_faces_gate_exits() {
        // tunnel running west to east
        let flags = MutualFaceFlags::from_connected_set(FaceFlags::WEST | FaceFlags::EAST);

        assert!(can_visit_face(flags, FaceFlags::WEST, Face::East));
        assert!(!can_visit_face(flags, FaceFlags::WEST, Face::Up));
        assert!(!can_visit_face(flags, FaceFlags::NORTH, Face::East));
        assert!(can_visit_face(flags, FaceFlags::NORTH | FaceFlags::WEST, Face::East));
    }
}

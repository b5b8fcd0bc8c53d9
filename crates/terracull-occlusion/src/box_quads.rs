//! Static dispatch table from face outcome to the quads that outline a box.
//!
//! Every combination of at most one face per axis (27 outcomes, including
//! the empty one) maps to one or two quads given as box corner indices.
//! Two visible faces are split across the box diagonal into two quads of
//! similar size rather than one large and one thin quad. With three visible
//! faces the corner nearest the camera is dropped and the silhouette is
//! covered by two quads instead of three.

use crate::constants::{
    DOWN, EAST, NORTH, OUTCOME_COUNT, SOUTH, UP, V000, V001, V010, V011, V100, V101, V110, V111,
    WEST,
};

/// Quads to rasterize for one face outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxQuads {
    len: u8,
    quads: [[u8; 4]; 2],
    /// Bit per box corner referenced by any quad.
    vertex_mask: u8,
}

impl BoxQuads {
    const EMPTY: Self = Self {
        len: 0,
        quads: [[0; 4]; 2],
        vertex_mask: 0,
    };

    const fn one(q: [u8; 4]) -> Self {
        Self {
            len: 1,
            quads: [q, [0; 4]],
            vertex_mask: corner_mask(q),
        }
    }

    const fn two(a: [u8; 4], b: [u8; 4]) -> Self {
        Self {
            len: 2,
            quads: [a, b],
            vertex_mask: corner_mask(a) | corner_mask(b),
        }
    }

    #[inline]
    pub fn quads(&self) -> &[[u8; 4]] {
        &self.quads[..self.len as usize]
    }

    #[inline]
    pub const fn vertex_mask(&self) -> u8 {
        self.vertex_mask
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

const fn corner_mask(q: [u8; 4]) -> u8 {
    (1 << q[0]) | (1 << q[1]) | (1 << q[2]) | (1 << q[3])
}

/// True when the outcome does not claim both faces of any axis.
#[inline]
#[must_use]
pub const fn is_valid_outcome(outcome: usize) -> bool {
    outcome < OUTCOME_COUNT
        && (outcome & (UP | DOWN)) != (UP | DOWN)
        && (outcome & (EAST | WEST)) != (EAST | WEST)
        && (outcome & (NORTH | SOUTH)) != (NORTH | SOUTH)
}

/// Indexed by outcome bits. Invalid outcomes map to an empty entry.
pub static BOX_QUADS: [BoxQuads; OUTCOME_COUNT] = build_table();

const fn build_table() -> [BoxQuads; OUTCOME_COUNT] {
    let mut t = [BoxQuads::EMPTY; OUTCOME_COUNT];

    t[UP] = BoxQuads::one([V110, V010, V011, V111]);
    t[DOWN] = BoxQuads::one([V000, V100, V101, V001]);
    t[EAST] = BoxQuads::one([V101, V100, V110, V111]);
    t[WEST] = BoxQuads::one([V000, V001, V011, V010]);
    t[NORTH] = BoxQuads::one([V100, V000, V010, V110]);
    t[SOUTH] = BoxQuads::one([V001, V101, V111, V011]);

    t[UP | EAST] = BoxQuads::two([V010, V011, V111, V101], [V101, V100, V110, V010]);
    t[UP | WEST] = BoxQuads::two([V111, V110, V010, V000], [V000, V001, V011, V111]);
    t[UP | NORTH] = BoxQuads::two([V011, V111, V110, V100], [V100, V000, V010, V011]);
    t[UP | SOUTH] = BoxQuads::two([V110, V010, V011, V001], [V001, V101, V111, V110]);
    t[DOWN | EAST] = BoxQuads::two([V001, V000, V100, V110], [V110, V111, V101, V001]);
    t[DOWN | WEST] = BoxQuads::two([V100, V101, V001, V011], [V011, V010, V000, V100]);
    t[DOWN | NORTH] = BoxQuads::two([V101, V001, V000, V010], [V010, V110, V100, V101]);
    t[DOWN | SOUTH] = BoxQuads::two([V000, V100, V101, V111], [V111, V011, V001, V000]);
    t[NORTH | EAST] = BoxQuads::two([V000, V010, V110, V111], [V111, V101, V100, V000]);
    t[NORTH | WEST] = BoxQuads::two([V110, V100, V000, V001], [V001, V011, V010, V110]);
    t[SOUTH | EAST] = BoxQuads::two([V011, V001, V101, V100], [V100, V110, V111, V011]);
    t[SOUTH | WEST] = BoxQuads::two([V101, V111, V011, V010], [V010, V000, V001, V101]);

    t[UP | EAST | NORTH] = BoxQuads::two([V011, V111, V101, V100], [V100, V000, V010, V011]);
    t[UP | WEST | NORTH] = BoxQuads::two([V111, V110, V100, V000], [V000, V001, V011, V111]);
    t[UP | EAST | SOUTH] = BoxQuads::two([V010, V011, V001, V101], [V101, V100, V110, V010]);
    t[UP | WEST | SOUTH] = BoxQuads::two([V110, V010, V000, V001], [V001, V101, V111, V110]);
    t[DOWN | EAST | NORTH] = BoxQuads::two([V001, V000, V010, V110], [V110, V111, V101, V001]);
    t[DOWN | WEST | NORTH] = BoxQuads::two([V101, V001, V011, V010], [V010, V110, V100, V101]);
    t[DOWN | EAST | SOUTH] = BoxQuads::two([V000, V100, V110, V111], [V111, V011, V001, V000]);
    t[DOWN | WEST | SOUTH] = BoxQuads::two([V100, V101, V111, V011], [V011, V010, V000, V100]);

    t
}

//! Coverage-only software rasterizer over a tiled bitset.
//!
//! Vertices are transformed to clip space with a fixed-point matrix, quads are
//! clipped against the near plane and a guard band, projected to sub-pixel
//! screen coordinates and scan-converted with edge functions. Tiles entirely
//! inside or outside the polygon are classified from their corners before any
//! per-pixel work.
//!
//! Pixel row 0 is the bottom of the screen. Within a tile, bit
//! `(row << 3) | col` covers the pixel at that tile-local row and column.

use crate::constants::{
    HALF_PIXEL_HEIGHT_SUB, HALF_PIXEL_WIDTH_SUB, MATRIX_PRECISION_UNITY, PIXEL_HEIGHT, PIXEL_WIDTH,
    SUBPIXEL_BITS, SUBPIXEL_HALF, SUBPIXEL_UNITY, TILE_AXIS_MASK, TILE_AXIS_SHIFT, TILE_COUNT,
    TILE_WIDTH,
};
use crate::matrix::Matrix4L;

/// Smallest clip-space w kept after near clipping: 1/16 of a block.
const NEAR_W: i64 = MATRIX_PRECISION_UNITY >> 4;
/// Polygons are clipped to twice the visible NDC extent so projected
/// coordinates stay bounded.
const GUARD_BAND: i64 = 2;
/// A quad gains at most one vertex per clip plane.
const MAX_POLY_VERTS: usize = 4 + CLIP_PLANES;
const CLIP_PLANES: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct ClipVertex {
    x: i64,
    y: i64,
    w: i64,
}

impl ClipVertex {
    #[inline]
    const fn plane_distance(self, plane: usize) -> i64 {
        match plane {
            0 => self.w - NEAR_W,
            1 => GUARD_BAND * self.w - self.x,
            2 => GUARD_BAND * self.w + self.x,
            3 => GUARD_BAND * self.w - self.y,
            _ => GUARD_BAND * self.w + self.y,
        }
    }

    /// Point on segment `self -> other` where the plane distance is zero.
    fn intersect(self, other: Self, d0: i64, d1: i64) -> Self {
        let num = i128::from(d0);
        let den = i128::from(d0 - d1);
        let lerp = |a: i64, b: i64| a + (i128::from(b - a) * num / den) as i64;
        Self {
            x: lerp(self.x, other.x),
            y: lerp(self.y, other.y),
            w: lerp(self.w, other.w),
        }
    }

    /// Sub-pixel screen position. Requires `w > 0`.
    #[inline]
    fn project(self) -> (i64, i64) {
        (
            HALF_PIXEL_WIDTH_SUB + self.x * HALF_PIXEL_WIDTH_SUB / self.w,
            HALF_PIXEL_HEIGHT_SUB + self.y * HALF_PIXEL_HEIGHT_SUB / self.w,
        )
    }
}

#[derive(Clone, Copy)]
struct Polygon {
    verts: [ClipVertex; MAX_POLY_VERTS],
    len: usize,
}

impl Polygon {
    const EMPTY: Self = Self {
        verts: [ClipVertex { x: 0, y: 0, w: 0 }; MAX_POLY_VERTS],
        len: 0,
    };

    #[inline]
    fn push(&mut self, v: ClipVertex) {
        debug_assert!(self.len < MAX_POLY_VERTS);
        self.verts[self.len] = v;
        self.len += 1;
    }

    fn vertices(&self) -> &[ClipVertex] {
        &self.verts[..self.len]
    }

    /// Sutherland-Hodgman against one plane.
    fn clip(&self, plane: usize) -> Self {
        let mut out = Self::EMPTY;
        let verts = self.vertices();

        for (i, &cur) in verts.iter().enumerate() {
            let next = verts[(i + 1) % verts.len()];
            let d0 = cur.plane_distance(plane);
            let d1 = next.plane_distance(plane);

            if d0 >= 0 {
                out.push(cur);
            }

            if (d0 >= 0) != (d1 >= 0) {
                out.push(cur.intersect(next, d0, d1));
            }
        }

        out
    }
}

/// Half-plane `a * x + b * y + c >= 0` over sub-pixel coordinates.
#[derive(Clone, Copy, Default)]
struct Edge {
    a: i64,
    b: i64,
    c: i64,
}

impl Edge {
    #[inline]
    const fn eval(self, x: i64, y: i64) -> i64 {
        self.a * x + self.b * y + self.c
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Draw,
    Test,
}

/// Tile coverage buffer plus the transform used to feed it.
#[derive(Clone)]
pub struct Rasterizer {
    tiles: Box<[u64]>,
    /// Region-local model-view-projection used by [`Rasterizer::setup_vertex`].
    pub mvp: Matrix4L,
    vertices: [ClipVertex; 8],
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tiles: vec![0; TILE_COUNT].into_boxed_slice(),
            mvp: Matrix4L::IDENTITY,
            vertices: [ClipVertex::default(); 8],
        }
    }

    /// Clear all coverage.
    pub fn clear(&mut self) {
        self.tiles.fill(0);
    }

    pub fn copy_from(&mut self, other: &Self) {
        self.tiles.copy_from_slice(&other.tiles);
        self.mvp = other.mvp;
        self.vertices = other.vertices;
    }

    /// Raw tile words, row-major from the bottom-left tile.
    #[must_use]
    pub fn tiles(&self) -> &[u64] {
        &self.tiles
    }

    /// Transform a region-local corner into vertex slot `index` (0..8).
    #[inline]
    pub fn setup_vertex(&mut self, index: u8, x: i32, y: i32, z: i32) {
        let [cx, cy, _, cw] = self.mvp.transform_point(x, y, z);
        self.vertices[index as usize] = ClipVertex { x: cx, y: cy, w: cw };
    }

    /// Add the quad formed by four vertex slots to the coverage buffer.
    pub fn draw_quad(&mut self, v0: u8, v1: u8, v2: u8, v3: u8) {
        self.raster_quad([v0, v1, v2, v3], Mode::Draw);
    }

    /// True if any pixel covered by the quad is not yet covered in the buffer.
    #[must_use]
    pub fn test_quad(&mut self, v0: u8, v1: u8, v2: u8, v3: u8) -> bool {
        self.raster_quad([v0, v1, v2, v3], Mode::Test)
    }

    /// Coverage of a single pixel. Out-of-range pixels are uncovered.
    #[must_use]
    pub fn test_pixel(&self, x: i32, y: i32) -> bool {
        if !(0..PIXEL_WIDTH).contains(&x) || !(0..PIXEL_HEIGHT).contains(&y) {
            return false;
        }

        let tile = ((y >> TILE_AXIS_SHIFT) as usize) * TILE_WIDTH + (x >> TILE_AXIS_SHIFT) as usize;
        let bit = ((y & TILE_AXIS_MASK) << TILE_AXIS_SHIFT) | (x & TILE_AXIS_MASK);
        self.tiles[tile] & (1u64 << bit) != 0
    }

    /// Number of covered pixels.
    #[must_use]
    pub fn covered_pixel_count(&self) -> u32 {
        self.tiles.iter().map(|t| t.count_ones()).sum()
    }

    fn raster_quad(&mut self, indices: [u8; 4], mode: Mode) -> bool {
        let mut poly = Polygon::EMPTY;
        for i in indices {
            poly.push(self.vertices[i as usize]);
        }

        for plane in 0..CLIP_PLANES {
            if poly.vertices().iter().any(|v| v.plane_distance(plane) < 0) {
                poly = poly.clip(plane);
                if poly.len < 3 {
                    return false;
                }
            }
        }

        let mut points = [(0i64, 0i64); MAX_POLY_VERTS];
        for (p, v) in points.iter_mut().zip(poly.vertices()) {
            *p = v.project();
        }

        self.raster_polygon(&points[..poly.len], mode)
    }

    fn raster_polygon(&mut self, points: &[(i64, i64)], mode: Mode) -> bool {
        let n = points.len();
        let mut area2 = 0i64;
        for i in 0..n {
            let (x0, y0) = points[i];
            let (x1, y1) = points[(i + 1) % n];
            area2 += x0 * y1 - x1 * y0;
        }

        // Degenerate polygons cover nothing.
        if area2 == 0 {
            return false;
        }

        let mut edges = [Edge::default(); MAX_POLY_VERTS];
        for (i, edge) in edges.iter_mut().enumerate().take(n) {
            let (x0, y0) = points[i];
            let (x1, y1) = points[(i + 1) % n];
            let a = y0 - y1;
            let b = x1 - x0;
            let c = -(a * x0 + b * y0);
            *edge = if area2 > 0 {
                Edge { a, b, c }
            } else {
                Edge { a: -a, b: -b, c: -c }
            };
        }
        let edges = &edges[..n];

        let (min_x, max_x, min_y, max_y) = points.iter().fold(
            (i64::MAX, i64::MIN, i64::MAX, i64::MIN),
            |(x0, x1, y0, y1), &(x, y)| (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
        );

        // Pixels whose sample center lies inside the bounds.
        let px0 = ceil_to_pixel(min_x).max(0);
        let px1 = floor_to_pixel(max_x).min(i64::from(PIXEL_WIDTH - 1));
        let py0 = ceil_to_pixel(min_y).max(0);
        let py1 = floor_to_pixel(max_y).min(i64::from(PIXEL_HEIGHT - 1));

        if px0 > px1 || py0 > py1 {
            return false;
        }

        let (tx0, tx1) = (px0 >> TILE_AXIS_SHIFT, px1 >> TILE_AXIS_SHIFT);
        let (ty0, ty1) = (py0 >> TILE_AXIS_SHIFT, py1 >> TILE_AXIS_SHIFT);

        for ty in ty0..=ty1 {
            for tx in tx0..=tx1 {
                let mask = tile_coverage(edges, tx, ty);

                if mask == 0 {
                    continue;
                }

                let index = ty as usize * TILE_WIDTH + tx as usize;

                match mode {
                    Mode::Test => {
                        if mask & !self.tiles[index] != 0 {
                            return true;
                        }
                    }
                    Mode::Draw => self.tiles[index] |= mask,
                }
            }
        }

        false
    }
}

#[inline]
const fn ceil_to_pixel(sub: i64) -> i64 {
    -(-(sub - SUBPIXEL_HALF)).div_euclid(SUBPIXEL_UNITY)
}

#[inline]
const fn floor_to_pixel(sub: i64) -> i64 {
    (sub - SUBPIXEL_HALF).div_euclid(SUBPIXEL_UNITY)
}

/// Sample center of a pixel in sub-pixel units.
#[inline]
const fn pixel_center(pixel: i64) -> i64 {
    (pixel << SUBPIXEL_BITS) + SUBPIXEL_HALF
}

/// Coverage mask of one 8x8 tile against a convex polygon.
fn tile_coverage(edges: &[Edge], tx: i64, ty: i64) -> u64 {
    let x0 = pixel_center(tx << TILE_AXIS_SHIFT);
    let y0 = pixel_center(ty << TILE_AXIS_SHIFT);
    let span = i64::from(TILE_AXIS_MASK) * SUBPIXEL_UNITY;
    let (x1, y1) = (x0 + span, y0 + span);

    let mut partial = [false; MAX_POLY_VERTS];
    let mut any_partial = false;

    for (i, e) in edges.iter().enumerate() {
        let corners = [e.eval(x0, y0), e.eval(x1, y0), e.eval(x0, y1), e.eval(x1, y1)];
        let max = corners.iter().copied().max().unwrap_or(i64::MIN);

        if max < 0 {
            return 0;
        }

        if corners.iter().any(|&c| c < 0) {
            partial[i] = true;
            any_partial = true;
        }
    }

    if !any_partial {
        return u64::MAX;
    }

    let mut mask = 0u64;
    for row in 0..8 {
        let y = y0 + row * SUBPIXEL_UNITY;
        for col in 0..8 {
            let x = x0 + col * SUBPIXEL_UNITY;
            let inside = edges
                .iter()
                .zip(partial.iter())
                .all(|(e, &p)| !p || e.eval(x, y) >= 0);
            if inside {
                mask |= 1u64 << ((row << TILE_AXIS_SHIFT) | col);
            }
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rasterizer whose MVP maps x/y straight to NDC at a fixed depth:
    /// one block spans 1/64 of the half screen width.
    fn ortho_like() -> Rasterizer {
        let mut r = Rasterizer::new();
        let unity = MATRIX_PRECISION_UNITY;
        let m = glam::Mat4::from_cols_array_2d(&[
            [1.0 / 64.0, 0.0, 0.0, 0.0],
            [0.0, 1.0 / 64.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        r.mvp = Matrix4L::from_mat4(&m);
        assert_eq!(r.mvp.get(3, 3), unity);
        r
    }

    fn square(r: &mut Rasterizer, x0: i32, y0: i32, x1: i32, y1: i32) {
        r.setup_vertex(0, x0, y0, 0);
        r.setup_vertex(1, x1, y0, 0);
        r.setup_vertex(2, x1, y1, 0);
        r.setup_vertex(3, x0, y1, 0);
    }

    #[test]
    fn empty_buffer_sees_everything() {
        let mut r = ortho_like();
        square(&mut r, 0, 0, 4, 4);
        assert!(r.test_quad(0, 1, 2, 3));
        assert_eq!(r.covered_pixel_count(), 0);
    }

    #[test]
    fn drawn_quad_hides_itself_and_smaller_quads() {
        let mut r = ortho_like();
        square(&mut r, -8, -8, 8, 8);
        r.draw_quad(0, 1, 2, 3);
        assert!(!r.test_quad(0, 1, 2, 3));

        square(&mut r, -2, -2, 2, 2);
        assert!(!r.test_quad(0, 1, 2, 3));

        square(&mut r, 6, 6, 12, 12);
        assert!(r.test_quad(0, 1, 2, 3));
    }

    #[test]
    fn winding_does_not_matter() {
        let mut r = ortho_like();
        square(&mut r, -4, -4, 4, 4);
        r.draw_quad(3, 2, 1, 0);
        let reversed = r.covered_pixel_count();

        let mut r2 = ortho_like();
        square(&mut r2, -4, -4, 4, 4);
        r2.draw_quad(0, 1, 2, 3);
        assert_eq!(reversed, r2.covered_pixel_count());
        assert!(reversed > 0);
    }

    #[test]
    fn repeated_draw_is_idempotent() {
        let mut r = ortho_like();
        square(&mut r, -5, -3, 7, 9);
        r.draw_quad(0, 1, 2, 3);
        let once = r.tiles().to_vec();
        r.draw_quad(0, 1, 2, 3);
        assert_eq!(once, r.tiles());
    }

    #[test]
    fn quad_area_matches_pixel_count() {
        let mut r = ortho_like();
        // 8 blocks = 1/8 NDC = 64 pixels wide, 32 pixels tall
        square(&mut r, 0, 0, 8, 8);
        r.draw_quad(0, 1, 2, 3);
        assert_eq!(r.covered_pixel_count(), 64 * 32);
        assert!(r.test_pixel(512, 256));
        assert!(!r.test_pixel(511, 256));
        assert!(!r.test_pixel(576, 256));
    }

    #[test]
    fn degenerate_quad_covers_nothing() {
        let mut r = ortho_like();
        r.setup_vertex(0, 0, 0, 0);
        r.setup_vertex(1, 4, 0, 0);
        r.setup_vertex(2, 8, 0, 0);
        r.setup_vertex(3, 2, 0, 0);
        r.draw_quad(0, 1, 2, 3);
        assert_eq!(r.covered_pixel_count(), 0);
    }

    #[test]
    fn offscreen_quad_is_clipped_away() {
        let mut r = ortho_like();
        square(&mut r, 400, 400, 420, 420);
        assert!(!r.test_quad(0, 1, 2, 3));
        r.draw_quad(0, 1, 2, 3);
        assert_eq!(r.covered_pixel_count(), 0);
    }

    #[test]
    fn clear_and_copy() {
        let mut r = ortho_like();
        square(&mut r, -4, -4, 4, 4);
        r.draw_quad(0, 1, 2, 3);

        let mut copy = Rasterizer::new();
        copy.copy_from(&r);
        assert_eq!(copy.covered_pixel_count(), r.covered_pixel_count());

        r.clear();
        assert_eq!(r.covered_pixel_count(), 0);
        assert!(copy.covered_pixel_count() > 0);
    }
}

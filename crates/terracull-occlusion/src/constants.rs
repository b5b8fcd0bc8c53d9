//! Fixed-point scales, raster dimensions and box face encodings.

/// Fractional bits of camera-relative fixed-point coordinates.
pub const CAMERA_PRECISION_BITS: u32 = 12;
/// One block in camera fixed-point units.
pub const CAMERA_PRECISION_UNITY: i64 = 1 << CAMERA_PRECISION_BITS;

/// Fractional bits of [`crate::Matrix4L`] elements and clip-space coordinates.
pub const MATRIX_PRECISION_BITS: u32 = 16;
/// 1.0 in matrix fixed-point units.
pub const MATRIX_PRECISION_UNITY: i64 = 1 << MATRIX_PRECISION_BITS;

/// Fractional bits of projected screen coordinates.
pub const SUBPIXEL_BITS: u32 = 4;
pub const SUBPIXEL_UNITY: i64 = 1 << SUBPIXEL_BITS;
/// Offset from a pixel corner to its sample center.
pub const SUBPIXEL_HALF: i64 = SUBPIXEL_UNITY / 2;

/// Tiles are square blocks of 8x8 pixels packed into one `u64`.
pub const TILE_AXIS_SHIFT: u32 = 3;
pub const TILE_AXIS_LENGTH: i32 = 1 << TILE_AXIS_SHIFT;
pub const TILE_AXIS_MASK: i32 = TILE_AXIS_LENGTH - 1;

pub const TILE_WIDTH: usize = 128;
pub const TILE_HEIGHT: usize = 64;
pub const TILE_COUNT: usize = TILE_WIDTH * TILE_HEIGHT;

pub const PIXEL_WIDTH: i32 = (TILE_WIDTH as i32) << TILE_AXIS_SHIFT;
pub const PIXEL_HEIGHT: i32 = (TILE_HEIGHT as i32) << TILE_AXIS_SHIFT;

pub const HALF_PIXEL_WIDTH_SUB: i64 = ((PIXEL_WIDTH / 2) as i64) << SUBPIXEL_BITS;
pub const HALF_PIXEL_HEIGHT_SUB: i64 = ((PIXEL_HEIGHT / 2) as i64) << SUBPIXEL_BITS;

/// Box face outcome bits. A set bit means that face points toward the camera.
pub const UP: usize = 1;
pub const DOWN: usize = 2;
pub const EAST: usize = 4;
pub const WEST: usize = 8;
pub const NORTH: usize = 16;
pub const SOUTH: usize = 32;

/// Number of distinct outcome values, including invalid ones with opposing bits.
pub const OUTCOME_COUNT: usize = 64;

/// Box corner indices, named `Vxyz` with 0 for the min and 1 for the max coordinate.
pub const V000: u8 = 0b000;
pub const V001: u8 = 0b001;
pub const V010: u8 = 0b010;
pub const V011: u8 = 0b011;
pub const V100: u8 = 0b100;
pub const V101: u8 = 0b101;
pub const V110: u8 = 0b110;
pub const V111: u8 = 0b111;

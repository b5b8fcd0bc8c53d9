//! 64-bit fixed-point 4x4 matrix.
//!
//! Floating-point view matrices lose precision when combined with world
//! coordinates far from the origin. The occluder keeps its model-view-projection
//! in fixed point and folds camera-relative integer offsets in with
//! [`Matrix4L::translate`], so precision does not depend on where in the world
//! the camera is.

use glam::Mat4;

use crate::constants::{MATRIX_PRECISION_BITS, MATRIX_PRECISION_UNITY};

/// Column-major fixed-point matrix with [`MATRIX_PRECISION_BITS`] fractional bits.
///
/// Layout matches glam: `cols[c][r]` is row `r` of column `c`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Matrix4L {
    cols: [[i64; 4]; 4],
}

impl Default for Matrix4L {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4L {
    pub const IDENTITY: Self = Self {
        cols: [
            [MATRIX_PRECISION_UNITY, 0, 0, 0],
            [0, MATRIX_PRECISION_UNITY, 0, 0],
            [0, 0, MATRIX_PRECISION_UNITY, 0],
            [0, 0, 0, MATRIX_PRECISION_UNITY],
        ],
    };

    /// Convert a floating-point matrix, rounding each element.
    #[must_use]
    pub fn from_mat4(m: &Mat4) -> Self {
        let src = m.to_cols_array_2d();
        let mut cols = [[0; 4]; 4];
        for (dst, src) in cols.iter_mut().zip(src.iter()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d = (f64::from(*s) * MATRIX_PRECISION_UNITY as f64).round() as i64;
            }
        }
        Self { cols }
    }

    /// Convert back to floating point. Only used for diagnostics.
    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        let mut out = [[0.0f32; 4]; 4];
        for (dst, src) in out.iter_mut().zip(self.cols.iter()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d = (*s as f64 / MATRIX_PRECISION_UNITY as f64) as f32;
            }
        }
        Mat4::from_cols_array_2d(&out)
    }

    pub fn load_identity(&mut self) {
        *self = Self::IDENTITY;
    }

    pub fn copy_from(&mut self, other: &Self) {
        self.cols = other.cols;
    }

    /// Element at row `r`, column `c`.
    #[inline]
    #[must_use]
    pub const fn get(&self, r: usize, c: usize) -> i64 {
        self.cols[c][r]
    }

    /// `self = self * other`
    pub fn multiply(&mut self, other: &Self) {
        let a = self.cols;
        for c in 0..4 {
            for r in 0..4 {
                let sum = a[0][r] * other.cols[c][0]
                    + a[1][r] * other.cols[c][1]
                    + a[2][r] * other.cols[c][2]
                    + a[3][r] * other.cols[c][3];
                self.cols[c][r] = sum >> MATRIX_PRECISION_BITS;
            }
        }
    }

    /// Post-multiply by a translation whose components are fixed point with
    /// `precision_bits` fractional bits.
    pub fn translate(&mut self, x: i32, y: i32, z: i32, precision_bits: u32) {
        let (x, y, z) = (i64::from(x), i64::from(y), i64::from(z));
        for r in 0..4 {
            let delta = self.cols[0][r] * x + self.cols[1][r] * y + self.cols[2][r] * z;
            self.cols[3][r] += delta >> precision_bits;
        }
    }

    /// Transform an integer point, returning clip-space `[x, y, z, w]` in
    /// matrix fixed point.
    #[inline]
    #[must_use]
    pub fn transform_point(&self, x: i32, y: i32, z: i32) -> [i64; 4] {
        let (x, y, z) = (i64::from(x), i64::from(y), i64::from(z));
        let mut out = [0; 4];
        for (r, o) in out.iter_mut().enumerate() {
            *o = self.cols[0][r] * x + self.cols[1][r] * y + self.cols[2][r] * z + self.cols[3][r];
        }
        out
    }
}

impl std::fmt::Display for Matrix4L {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for r in 0..4 {
            if r > 0 {
                f.write_str(" | ")?;
            }
            write!(
                f,
                "{} {} {} {}",
                self.cols[0][r], self.cols[1][r], self.cols[2][r], self.cols[3][r]
            )?;
        }
        Ok(())
    }
}

//! Matrices.

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// A 3x3 matrix stored in row-major order.
#[repr(C)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "[[f64; 3]; 3]", from = "[[f64; 3]; 3]")
)]
#[derive(Clone, Copy, Default, PartialEq, Zeroable, Pod)]
pub struct Matrix3 {
    rows: [[f64; 3]; 3],
}

impl Matrix3 {
    /// Creates the identity matrix.
    #[inline]
    pub const fn identity() -> Self {
        Self::from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Creates a matrix with the given rows.
    #[inline]
    pub const fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self { rows }
    }

    /// The rows of the matrix.
    #[inline]
    pub const fn rows(&self) -> &[[f64; 3]; 3] {
        &self.rows
    }

    /// Returns the element at row `i` and column `j`.
    ///
    /// # Panics
    /// If the indices are outside the matrix.
    #[inline]
    pub fn element(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j]
    }

    /// Returns a matrix with the given closure applied to each element.
    #[inline]
    pub fn mapped(&self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self::from_rows(self.rows.map(|row| row.map(&mut f)))
    }

    /// Computes the matrix-vector product `M * v`.
    #[inline]
    pub fn mul_vector(&self, vector: &[f64; 3]) -> [f64; 3] {
        self.rows
            .map(|row| row[0] * vector[0] + row[1] * vector[1] + row[2] * vector[2])
    }
}

impl From<[[f64; 3]; 3]> for Matrix3 {
    fn from(rows: [[f64; 3]; 3]) -> Self {
        Self::from_rows(rows)
    }
}

impl From<Matrix3> for [[f64; 3]; 3] {
    fn from(matrix: Matrix3) -> Self {
        matrix.rows
    }
}

impl fmt::Debug for Matrix3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows.iter()).finish()
    }
}

//! Linear algebra providers
//!
//! Engines never reach for a global decomposition backend. Each one owns a
//! value implementing [`LinearAlgebra`], chosen at construction:
//!
//! - [`Jacobi`]: built-in cyclic Jacobi solver (default)
//! - [`Nalgebra`]: delegates to `nalgebra`'s SVD and symmetric eigensolver
//!
//! [`mat`] holds the 3×3 row-major helpers shared by both.

pub mod jacobi;
pub mod mat;
mod nalgebra_backend;

pub use jacobi::Jacobi;
pub use mat::Mat3;
pub use nalgebra_backend::Nalgebra;

/// Result of a 3×3 SVD: A = U · diag(S) · Vᵀ
///
/// Columns of `u` and `v` are the singular vectors; both are orthonormal but
/// their determinants are not normalized, so det(U)·det(V) carries the sign
/// of det(A).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Svd3 {
    pub u: Mat3,
    /// Singular values, descending, non-negative
    pub s: [f64; 3],
    pub v: Mat3,
}

/// Eigendecomposition of a symmetric 3×3 matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eigen3 {
    /// Eigenvalues, descending (may be negative)
    pub values: [f64; 3],
    /// Unit eigenvectors as columns, in the order of `values`
    pub vectors: Mat3,
}

/// Dense 3×3 decompositions used by the alignment and ADP engines
pub trait LinearAlgebra: Send + Sync {
    /// Singular value decomposition of a general 3×3 matrix
    fn svd3(&self, m: &Mat3) -> Svd3;

    /// Eigendecomposition of a symmetric 3×3 matrix
    fn symmetric_eigen3(&self, m: &Mat3) -> Eigen3;
}

impl<L: LinearAlgebra + ?Sized> LinearAlgebra for &L {
    fn svd3(&self, m: &Mat3) -> Svd3 {
        (**self).svd3(m)
    }

    fn symmetric_eigen3(&self, m: &Mat3) -> Eigen3 {
        (**self).symmetric_eigen3(m)
    }
}

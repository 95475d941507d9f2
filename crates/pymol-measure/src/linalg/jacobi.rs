//! Analytical 3×3 decompositions based on cyclic Jacobi rotations
//!
//! The symmetric eigenproblem is solved directly. The SVD of a general
//! matrix A is built from the eigendecomposition of AᵀA: V holds its
//! eigenvectors, σᵢ = √λᵢ, and U is completed column by column so that it is
//! always orthonormal even when A is rank deficient.

use super::mat::{
    arbitrary_perpendicular, cross, dot, from_columns, mat_mul3, mat_vec, normalize, scale,
    transpose3, Mat3,
};
use super::{Eigen3, LinearAlgebra, Svd3};

const MAX_SWEEPS: usize = 50;

/// Linear-algebra provider using the built-in Jacobi solver
#[derive(Debug, Clone, Copy, Default)]
pub struct Jacobi;

impl LinearAlgebra for Jacobi {
    fn svd3(&self, m: &Mat3) -> Svd3 {
        svd3(m)
    }

    fn symmetric_eigen3(&self, m: &Mat3) -> Eigen3 {
        let (values, vectors) = jacobi_eigen_3x3(m);
        let order = descending_order(&values);
        Eigen3 {
            values: [values[order[0]], values[order[1]], values[order[2]]],
            vectors: from_columns(&[vectors[order[0]], vectors[order[1]], vectors[order[2]]]),
        }
    }
}

/// Compute A = U · diag(S) · Vᵀ for a 3×3 matrix
pub fn svd3(a: &Mat3) -> Svd3 {
    // 1. AᵀA is symmetric positive semi-definite
    let ata = mat_mul3(&transpose3(a), a);

    // 2. Its eigenvectors are the right singular vectors
    let (eigenvalues, eigvec_cols) = jacobi_eigen_3x3(&ata);

    // 3. Sort by descending eigenvalue
    let order = descending_order(&eigenvalues);
    let sigma = [
        eigenvalues[order[0]].max(0.0).sqrt(),
        eigenvalues[order[1]].max(0.0).sqrt(),
        eigenvalues[order[2]].max(0.0).sqrt(),
    ];
    let v_cols = [eigvec_cols[order[0]], eigvec_cols[order[1]], eigvec_cols[order[2]]];

    // 4. Left singular vectors: u_i = A · v_i / σ_i, completed to an
    //    orthonormal basis where σ_i vanishes
    let tol = sigma[0] * 1e-10;

    let mut u0 = mat_vec(a, &v_cols[0]);
    if sigma[0] > 1e-300 {
        normalize(&mut u0);
    } else {
        u0 = [1.0, 0.0, 0.0];
    }

    let av1 = mat_vec(a, &v_cols[1]);
    let proj = dot(&av1, &u0);
    let mut u1 = [av1[0] - proj * u0[0], av1[1] - proj * u0[1], av1[2] - proj * u0[2]];
    let len1 = normalize(&mut u1);
    if sigma[1] <= tol || len1 <= tol {
        u1 = arbitrary_perpendicular(&u0);
    }

    // Third column is fixed up to sign by the first two
    let c = cross(&u0, &u1);
    let av2 = mat_vec(a, &v_cols[2]);
    let u2 = if dot(&av2, &c) < 0.0 { scale(&c, -1.0) } else { c };

    Svd3 {
        u: from_columns(&[u0, u1, u2]),
        s: sigma,
        v: from_columns(&v_cols),
    }
}

/// Indices that sort three values in descending order
fn descending_order(values: &[f64; 3]) -> [usize; 3] {
    let mut order = [0usize, 1, 2];
    if values[order[0]] < values[order[1]] {
        order.swap(0, 1);
    }
    if values[order[0]] < values[order[2]] {
        order.swap(0, 2);
    }
    if values[order[1]] < values[order[2]] {
        order.swap(1, 2);
    }
    order
}

/// Jacobi eigenvalue algorithm for 3×3 symmetric matrices.
///
/// Returns (eigenvalues, eigenvector_columns) in no particular order.
fn jacobi_eigen_3x3(m: &Mat3) -> ([f64; 3], [[f64; 3]; 3]) {
    let mut a = *m;
    let mut v = [[1.0f64, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    let scale2: f64 = a.iter().flatten().map(|x| x * x).sum();
    let threshold = scale2 * f64::EPSILON * f64::EPSILON;

    for _ in 0..MAX_SWEEPS {
        let off = a[0][1] * a[0][1] + a[0][2] * a[0][2] + a[1][2] * a[1][2];
        if off <= threshold {
            break;
        }
        for &(p, q) in &[(0usize, 1usize), (0, 2), (1, 2)] {
            if a[p][q] == 0.0 {
                continue;
            }
            jacobi_rotate(&mut a, &mut v, p, q);
        }
    }

    let eigenvalues = [a[0][0], a[1][1], a[2][2]];
    // v is row-major; column j is the j-th eigenvector
    let eigvec_cols = [
        [v[0][0], v[1][0], v[2][0]],
        [v[0][1], v[1][1], v[2][1]],
        [v[0][2], v[1][2], v[2][2]],
    ];
    (eigenvalues, eigvec_cols)
}

/// Apply a single Jacobi rotation to eliminate a[p][q].
fn jacobi_rotate(a: &mut Mat3, v: &mut Mat3, p: usize, q: usize) {
    let app = a[p][p];
    let aqq = a[q][q];
    let apq = a[p][q];

    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };
    let c = 1.0 / (1.0 + t * t).sqrt();
    let s = t * c;

    // A' = GᵀAG where G is the Givens rotation in the (p, q) plane
    a[p][p] = c * c * app - 2.0 * s * c * apq + s * s * aqq;
    a[q][q] = s * s * app + 2.0 * s * c * apq + c * c * aqq;
    a[p][q] = 0.0;
    a[q][p] = 0.0;

    let r = 3 - p - q;
    let arp = a[r][p];
    let arq = a[r][q];
    a[r][p] = c * arp - s * arq;
    a[p][r] = a[r][p];
    a[r][q] = s * arp + c * arq;
    a[q][r] = a[r][q];

    // V' = V · G
    for row in v.iter_mut() {
        let vip = row[p];
        let viq = row[q];
        row[p] = c * vip - s * viq;
        row[q] = s * vip + c * viq;
    }
}

//! `nalgebra`-backed provider

use nalgebra::{Matrix3, SymmetricEigen};

use super::mat::{from_columns, Mat3};
use super::{Eigen3, Jacobi, LinearAlgebra, Svd3};

/// Linear-algebra provider delegating to `nalgebra`
#[derive(Debug, Clone, Copy, Default)]
pub struct Nalgebra;

fn to_matrix3(m: &Mat3) -> Matrix3<f64> {
    Matrix3::new(
        m[0][0], m[0][1], m[0][2], //
        m[1][0], m[1][1], m[1][2], //
        m[2][0], m[2][1], m[2][2],
    )
}

fn column_of(m: &Matrix3<f64>, j: usize) -> [f64; 3] {
    [m[(0, j)], m[(1, j)], m[(2, j)]]
}

fn descending(values: [f64; 3]) -> [usize; 3] {
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    order
}

impl LinearAlgebra for Nalgebra {
    fn svd3(&self, m: &Mat3) -> Svd3 {
        let svd = to_matrix3(m).svd(true, true);
        let (u, v_t) = match (svd.u, svd.v_t) {
            (Some(u), Some(v_t)) => (u, v_t),
            _ => {
                log::debug!("nalgebra SVD returned no singular vectors, using Jacobi");
                return Jacobi.svd3(m);
            }
        };
        let v = v_t.transpose();
        let s = [svd.singular_values[0], svd.singular_values[1], svd.singular_values[2]];
        let order = descending(s);
        Svd3 {
            u: from_columns(&[
                column_of(&u, order[0]),
                column_of(&u, order[1]),
                column_of(&u, order[2]),
            ]),
            s: [s[order[0]], s[order[1]], s[order[2]]],
            v: from_columns(&[
                column_of(&v, order[0]),
                column_of(&v, order[1]),
                column_of(&v, order[2]),
            ]),
        }
    }

    fn symmetric_eigen3(&self, m: &Mat3) -> Eigen3 {
        let eig = SymmetricEigen::new(to_matrix3(m));
        let values = [eig.eigenvalues[0], eig.eigenvalues[1], eig.eigenvalues[2]];
        let order = descending(values);
        Eigen3 {
            values: [values[order[0]], values[order[1]], values[order[2]]],
            vectors: from_columns(&[
                column_of(&eig.eigenvectors, order[0]),
                column_of(&eig.eigenvectors, order[1]),
                column_of(&eig.eigenvectors, order[2]),
            ]),
        }
    }
}

//! Kabsch algorithm for optimal rigid-body superposition
//!
//! Given two sets of corresponding 3D points, finds the rotation and
//! translation that minimize the (weighted) squared displacement of the
//! mobile set onto the target set.

use crate::config::ExecutionPolicy;
use crate::coords::{centroid, Coord, CoordinateProvider, Coordinates};
use crate::error::{check_same_len, check_weights, MeasureError, MeasureResult};
use crate::linalg::mat::{det3, Mat3};
use crate::linalg::{Jacobi, LinearAlgebra};

use super::transform::Transformation;

/// Coordinates shifted to their (weighted) centroid
#[derive(Debug, Clone)]
pub(crate) struct Centered {
    pub centroid: Coord,
    pub coords: Vec<Coord>,
}

impl Centered {
    pub fn new(coords: &[Coord], weights: Option<&[f64]>) -> Self {
        let c = centroid(coords, weights);
        let coords = coords
            .iter()
            .map(|p| [p[0] - c[0], p[1] - c[1], p[2] - c[2]])
            .collect();
        Centered { centroid: c, coords }
    }
}

/// Cross-covariance H = targetᵀ · mobile of two centered sets
///
/// With weights each row of both operands is scaled by its weight and the
/// product is normalized by wᵀw.
pub(crate) fn cross_covariance(target: &[Coord], mobile: &[Coord], weights: Option<&[f64]>) -> Mat3 {
    let mut h = [[0.0f64; 3]; 3];
    match weights {
        None => {
            for (t, m) in target.iter().zip(mobile) {
                for row in 0..3 {
                    for col in 0..3 {
                        h[row][col] += t[row] * m[col];
                    }
                }
            }
        }
        Some(w) => {
            let w_dot: f64 = w.iter().map(|x| x * x).sum();
            for ((t, m), &wi) in target.iter().zip(mobile).zip(w) {
                let w2 = wi * wi;
                for row in 0..3 {
                    for col in 0..3 {
                        h[row][col] += w2 * t[row] * m[col];
                    }
                }
            }
            for row in h.iter_mut() {
                for x in row.iter_mut() {
                    *x /= w_dot;
                }
            }
        }
    }
    h
}

/// Rotation R = V · diag(1, 1, d) · Uᵀ for H = U · S · Vᵀ
///
/// `d` is the sign of det(H), taken from det(U)·det(V) so that it stays
/// defined when H is singular (planar or collinear point sets).
pub(crate) fn optimal_rotation<L: LinearAlgebra>(backend: &L, h: &Mat3) -> Mat3 {
    let svd = backend.svd3(h);
    if svd.s[1] <= svd.s[0] * 1e-12 {
        log::debug!(
            "Degenerate covariance (singular values {:?}); rotation is not unique",
            svd.s
        );
    }
    let d = if det3(&svd.u) * det3(&svd.v) < 0.0 { -1.0 } else { 1.0 };
    let diag = [1.0, 1.0, d];
    let mut rot = [[0.0f64; 3]; 3];
    for row in 0..3 {
        for col in 0..3 {
            rot[row][col] = (0..3).map(|k| svd.v[row][k] * diag[k] * svd.u[col][k]).sum();
        }
    }
    rot
}

/// Solve one mobile set against a pre-centered target
pub(crate) fn solve<L: LinearAlgebra>(
    backend: &L,
    mobile: &[Coord],
    target: &Centered,
    weights: Option<&[f64]>,
) -> Transformation {
    let mob = Centered::new(mobile, weights);
    let h = cross_covariance(&target.coords, &mob.coords, weights);
    let rotation = optimal_rotation(backend, &h);
    let moved = Transformation::new(rotation, [0.0; 3]).apply_point(&mob.centroid);
    let translation = [
        target.centroid[0] - moved[0],
        target.centroid[1] - moved[1],
        target.centroid[2] - moved[2],
    ];
    Transformation::new(rotation, translation)
}

/// Validate a mobile/target pair and its weights
pub(crate) fn check_pair(n_mobile: usize, n_target: usize, weights: Option<&[f64]>) -> MeasureResult<()> {
    check_same_len(n_target, n_mobile)?;
    if n_target == 0 {
        return Err(MeasureError::EmptyCoordinates);
    }
    check_weights(weights, n_target)
}

/// Superposition engine
///
/// Owns its linear-algebra provider and execution policy; both are fixed at
/// construction.
///
/// ```
/// use pymol_measure::Aligner;
///
/// let mobile = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
/// let target = [[2.0, 3.0, 0.0], [2.0, 4.0, 0.0], [1.0, 3.0, 0.0]];
/// let t = Aligner::new().calc_transformation(&mobile, &target, None).unwrap();
/// assert!((t.translation()[0] - 2.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Aligner<L = Jacobi> {
    backend: L,
    policy: ExecutionPolicy,
}

impl Aligner<Jacobi> {
    /// Aligner using the built-in Jacobi solver
    pub fn new() -> Self {
        Self::with_backend(Jacobi)
    }
}

impl<L: LinearAlgebra> Aligner<L> {
    /// Aligner using a specific linear-algebra provider
    pub fn with_backend(backend: L) -> Self {
        Aligner {
            backend,
            policy: ExecutionPolicy::default(),
        }
    }

    /// Enable or disable parallel processing of frames
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.policy.parallel = parallel;
        self
    }

    /// Replace the execution policy
    pub fn policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn backend(&self) -> &L {
        &self.backend
    }

    pub fn execution_policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    /// Transformation that minimizes the weighted RMSD of `mobile` onto `target`.
    ///
    /// Both inputs must have the same, non-zero number of points; `weights`
    /// needs one value per point.
    pub fn calc_transformation<'m, 't>(
        &self,
        mobile: impl Into<Coordinates<'m>>,
        target: impl Into<Coordinates<'t>>,
        weights: Option<&[f64]>,
    ) -> MeasureResult<Transformation> {
        let mobile = mobile.into().resolve();
        let target = target.into().resolve();
        check_pair(mobile.len(), target.len(), weights)?;

        let target = Centered::new(&target, weights);
        Ok(solve(&self.backend, &mobile, &target, weights))
    }

    /// Superpose `mobile` onto `target`.
    ///
    /// Returns the moved copy of `mobile` and the transformation used.
    pub fn superpose<'m, 't>(
        &self,
        mobile: impl Into<Coordinates<'m>>,
        target: impl Into<Coordinates<'t>>,
        weights: Option<&[f64]>,
    ) -> MeasureResult<(Vec<Coord>, Transformation)> {
        let mobile = mobile.into().resolve();
        let t = self.calc_transformation(Coordinates::Array(&mobile), target, weights)?;
        Ok((t.apply(&mobile), t))
    }

    /// Superpose a coordinate provider onto `target`, updating it in place
    pub fn superpose_provider<'t, P>(
        &self,
        mobile: &mut P,
        target: impl Into<Coordinates<'t>>,
        weights: Option<&[f64]>,
    ) -> MeasureResult<Transformation>
    where
        P: CoordinateProvider + ?Sized,
    {
        let coords = mobile.coordinates();
        let t = self.calc_transformation(Coordinates::Array(&coords), target, weights)?;
        mobile.set_coordinates(t.apply(&coords))?;
        Ok(t)
    }
}

/// [`Aligner::calc_transformation`] with the default provider
pub fn calc_transformation<'m, 't>(
    mobile: impl Into<Coordinates<'m>>,
    target: impl Into<Coordinates<'t>>,
    weights: Option<&[f64]>,
) -> MeasureResult<Transformation> {
    Aligner::new().calc_transformation(mobile, target, weights)
}

/// [`Aligner::superpose`] with the default provider
pub fn superpose<'m, 't>(
    mobile: impl Into<Coordinates<'m>>,
    target: impl Into<Coordinates<'t>>,
    weights: Option<&[f64]>,
) -> MeasureResult<(Vec<Coord>, Transformation)> {
    Aligner::new().superpose(mobile, target, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::mat::{max_abs_diff, IDENTITY3};
    use crate::linalg::Nalgebra;
    use crate::rmsd::calc_rmsd;

    fn tetrahedron() -> Vec<Coord> {
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.3, 0.7, -0.4],
        ]
    }

    #[test]
    fn test_identity_case() {
        let points = tetrahedron();
        let t = calc_transformation(&points, &points, None).unwrap();
        assert!(max_abs_diff(&t.rotation(), &IDENTITY3) < 1e-9);
        for k in 0..3 {
            assert!(t.translation()[k].abs() < 1e-9);
        }
    }

    #[test]
    fn test_pure_translation() {
        let source = tetrahedron();
        let target: Vec<Coord> = source.iter().map(|p| [p[0] + 5.0, p[1] + 3.0, p[2] + 1.0]).collect();
        let t = calc_transformation(&source, &target, None).unwrap();
        let expected = [5.0, 3.0, 1.0];
        for k in 0..3 {
            assert!((t.translation()[k] - expected[k]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_known_rotation_planar() {
        let reference = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let target: Vec<Coord> = reference.iter().map(|p| [-p[1] + 2.0, p[0] + 3.0, p[2]]).collect();
        let t = calc_transformation(&reference, &target, None).unwrap();
        let expected = [[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(
            max_abs_diff(&t.rotation(), &expected) < 1e-9,
            "rotation {:?}",
            t.rotation()
        );
        let tr = t.translation();
        assert!((tr[0] - 2.0).abs() < 1e-9 && (tr[1] - 3.0).abs() < 1e-9 && tr[2].abs() < 1e-9);
    }

    #[test]
    fn test_reflection_handling() {
        let source = vec![
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
        ];
        let target: Vec<Coord> = source.iter().map(|p| [p[0], p[1], -p[2]]).collect();
        let t = calc_transformation(&source, &target, None).unwrap();
        assert!((det3(&t.rotation()) - 1.0).abs() < 1e-9);
        assert!(t.is_proper_rotation(1e-9));
    }

    #[test]
    fn test_weighted_covariance_normalization() {
        let a = [[1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let b = [[0.0, 1.0, 0.0], [3.0, 0.0, 0.0]];
        let w = [1.0, 2.0];
        let h = cross_covariance(&a, &b, Some(&w));
        // Σ w² a_i ⊗ b_i / Σ w² = (1·[1,0,0]⊗[0,1,0] + 4·[0,2,0]⊗[3,0,0]) / 5
        assert!((h[0][1] - 1.0 / 5.0).abs() < 1e-12);
        assert!((h[1][0] - 24.0 / 5.0).abs() < 1e-12);
        assert!(h[2][2].abs() < 1e-12);
    }

    #[test]
    fn test_uniform_weights_match_unweighted() {
        let source = tetrahedron();
        let target: Vec<Coord> = source
            .iter()
            .map(|p| [0.8 * p[0] - 0.6 * p[1] + 0.1, 0.6 * p[0] + 0.8 * p[1] + 0.05, p[2] - 0.2 + 0.01 * p[0]])
            .collect();
        let plain = calc_transformation(&source, &target, None).unwrap();
        let weighted = calc_transformation(&source, &target, Some(&[2.5; 5])).unwrap();
        assert!(max_abs_diff(&plain.rotation(), &weighted.rotation()) < 1e-9);
        for k in 0..3 {
            assert!((plain.translation()[k] - weighted.translation()[k]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_weight_ignores_point() {
        let source = tetrahedron();
        let mut target: Vec<Coord> = source.iter().map(|p| [p[0] + 1.0, p[1], p[2]]).collect();
        target[4] = [50.0, -20.0, 7.0];
        let w = [1.0, 1.0, 1.0, 1.0, 0.0];
        let t = calc_transformation(&source, &target, Some(&w)).unwrap();
        let moved = t.apply(&source[..4]);
        assert!(calc_rmsd(&moved, &target[..4], None).unwrap() < 1e-9);
    }

    #[test]
    fn test_backends_agree() {
        let source = tetrahedron();
        let target: Vec<Coord> = source.iter().map(|p| [p[2] + 1.0, p[0] - 2.0, p[1]]).collect();
        let a = Aligner::new().calc_transformation(&source, &target, None).unwrap();
        let b = Aligner::with_backend(Nalgebra)
            .calc_transformation(&source, &target, None)
            .unwrap();
        assert!(max_abs_diff(&a.rotation(), &b.rotation()) < 1e-9);
    }

    #[test]
    fn test_superpose_moves_mobile() {
        let source = tetrahedron();
        let target: Vec<Coord> = source.iter().map(|p| [-p[1], p[0], p[2] + 4.0]).collect();
        let (moved, t) = superpose(&source, &target, None).unwrap();
        assert!(calc_rmsd(&moved, &target, None).unwrap() < 1e-9);
        assert!(t.is_proper_rotation(1e-9));
    }

    #[test]
    fn test_superpose_provider() {
        let mut mobile = tetrahedron();
        let target: Vec<Coord> = mobile.iter().map(|p| [p[0] - 1.0, p[1] + 1.0, p[2]]).collect();
        Aligner::new().superpose_provider(&mut mobile, &target, None).unwrap();
        assert!(calc_rmsd(&mobile, &target, None).unwrap() < 1e-9);
    }

    #[test]
    fn test_length_mismatch() {
        let a = vec![[0.0; 3]; 5];
        let b = vec![[0.0; 3]; 4];
        let err = calc_transformation(&a, &b, None).unwrap_err();
        assert_eq!(err, MeasureError::LengthMismatch(4, 5));
    }

    #[test]
    fn test_empty_and_bad_weights() {
        let empty: Vec<Coord> = Vec::new();
        assert_eq!(
            calc_transformation(&empty, &empty, None).unwrap_err(),
            MeasureError::EmptyCoordinates
        );
        let a = tetrahedron();
        assert!(calc_transformation(&a, &a, Some(&[1.0; 4])).unwrap_err().is_shape_error());
    }

    #[test]
    fn test_degenerate_input_returns_proper_rotation() {
        let a = vec![[1.0, 2.0, 3.0]; 4];
        let b = vec![[-1.0, 0.0, 5.0]; 4];
        let t = calc_transformation(&a, &b, None).unwrap();
        assert!(t.is_proper_rotation(1e-9));
        let moved = t.apply(&a);
        assert!(calc_rmsd(&moved, &b, None).unwrap() < 1e-9);
    }
}

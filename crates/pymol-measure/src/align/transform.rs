//! Rigid-body transformation value object
//!
//! A rotation matrix and a translation vector applied in row-vector
//! convention: `x' = x · R + t`.

use lin_alg::f64::Mat4;
use serde::{Deserialize, Serialize};

use crate::coords::{Coord, CoordinateProvider};
use crate::error::{MeasureError, MeasureResult};
use crate::linalg::mat::{det3, homogeneous, max_abs_diff, mat_mul3, transpose3, vec_mat, Mat3, IDENTITY3};

/// Rotation + translation produced by superposition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    rotation: Mat3,
    translation: [f64; 3],
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transformation {
    /// Create a transformation from a row-major rotation and a translation
    pub fn new(rotation: Mat3, translation: [f64; 3]) -> Self {
        Transformation {
            rotation,
            translation,
        }
    }

    /// Identity transformation
    pub fn identity() -> Self {
        Self::new(IDENTITY3, [0.0; 3])
    }

    /// Create a transformation from untyped slices
    ///
    /// `rotation` must hold exactly 9 values (row-major 3×3) and
    /// `translation` exactly 3.
    pub fn from_slices(rotation: &[f64], translation: &[f64]) -> MeasureResult<Self> {
        if rotation.len() != 9 {
            return Err(MeasureError::invalid_shape(
                "rotation",
                format!("expected a 3x3 matrix (9 values), got {} values", rotation.len()),
            ));
        }
        if translation.len() != 3 {
            return Err(MeasureError::invalid_shape(
                "translation",
                format!("expected 3 values, got {}", translation.len()),
            ));
        }
        let mut r = [[0.0f64; 3]; 3];
        for (row, chunk) in r.iter_mut().zip(rotation.chunks_exact(3)) {
            row.copy_from_slice(chunk);
        }
        Ok(Self::new(r, [translation[0], translation[1], translation[2]]))
    }

    /// Copy of the rotation matrix
    pub fn rotation(&self) -> Mat3 {
        self.rotation
    }

    /// Copy of the translation vector
    pub fn translation(&self) -> [f64; 3] {
        self.translation
    }

    /// 4×4 homogeneous matrix: rotation top-left, translation in the last column
    pub fn matrix4(&self) -> [[f64; 4]; 4] {
        homogeneous(&self.rotation, &self.translation)
    }

    /// Same layout as [`matrix4`](Self::matrix4), as a row-major `lin_alg` Mat4
    pub fn to_mat4(&self) -> Mat4 {
        let m = self.matrix4();
        let mut data = [0.0f64; 16];
        for row in 0..4 {
            data[row * 4..row * 4 + 4].copy_from_slice(&m[row]);
        }
        Mat4 { data }
    }

    /// True when the rotation is orthonormal with determinant +1 within `tol`
    pub fn is_proper_rotation(&self, tol: f64) -> bool {
        let rrt = mat_mul3(&self.rotation, &transpose3(&self.rotation));
        max_abs_diff(&rrt, &IDENTITY3) <= tol && (det3(&self.rotation) - 1.0).abs() <= tol
    }

    /// Transform a single point
    #[inline]
    pub fn apply_point(&self, p: &Coord) -> Coord {
        let r = vec_mat(p, &self.rotation);
        [
            r[0] + self.translation[0],
            r[1] + self.translation[1],
            r[2] + self.translation[2],
        ]
    }

    /// Return a transformed copy of `coords`
    pub fn apply(&self, coords: &[Coord]) -> Vec<Coord> {
        coords.iter().map(|p| self.apply_point(p)).collect()
    }

    /// Transform `coords` in place
    pub fn apply_in_place(&self, coords: &mut [Coord]) {
        for p in coords.iter_mut() {
            *p = self.apply_point(p);
        }
    }

    /// Transform the active coordinate set of a provider and return it
    pub fn apply_to<'a, P>(&self, target: &'a mut P) -> MeasureResult<&'a mut P>
    where
        P: CoordinateProvider + ?Sized,
    {
        let coords = self.apply(&target.coordinates());
        target.set_coordinates(coords)?;
        Ok(target)
    }

    /// Transformation equivalent to applying `self`, then `other`
    pub fn then(&self, other: &Transformation) -> Transformation {
        Transformation {
            rotation: mat_mul3(&self.rotation, &other.rotation),
            translation: other.apply_point(&self.translation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rot_z_90() -> Mat3 {
        // Row-vector convention: (x, y, z) · R = (-y, x, z)
        [[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]
    }

    #[test]
    fn test_from_slices_validates_shape() {
        assert!(Transformation::from_slices(&[1.0; 9], &[0.0; 3]).is_ok());
        let err = Transformation::from_slices(&[1.0; 8], &[0.0; 3]).unwrap_err();
        assert!(err.is_shape_error());
        let err = Transformation::from_slices(&[1.0; 9], &[0.0; 4]).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_from_slices_is_row_major() {
        let t = Transformation::from_slices(
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
            &[0.5, 0.0, 0.0],
        )
        .unwrap();
        assert_eq!(t.rotation()[0], [1.0, 2.0, 3.0]);
        assert_eq!(t.rotation()[2], [7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_accessors_return_copies() {
        let t = Transformation::new(rot_z_90(), [1.0, 2.0, 3.0]);
        let mut r = t.rotation();
        r[0][0] = 42.0;
        let mut v = t.translation();
        v[0] = 42.0;
        assert_eq!(t.rotation()[0][0], 0.0);
        assert_eq!(t.translation()[0], 1.0);
    }

    #[test]
    fn test_matrix4_layout() {
        let t = Transformation::new(rot_z_90(), [2.0, 3.0, 4.0]);
        let m = t.matrix4();
        assert_eq!(m[0], [0.0, 1.0, 0.0, 2.0]);
        assert_eq!(m[1], [-1.0, 0.0, 0.0, 3.0]);
        assert_eq!(m[2], [0.0, 0.0, 1.0, 4.0]);
        assert_eq!(m[3], [0.0, 0.0, 0.0, 1.0]);

        let mat4 = t.to_mat4();
        assert_eq!(mat4.data[3], 2.0);
        assert_eq!(mat4.data[7], 3.0);
        assert_eq!(mat4.data[15], 1.0);
    }

    #[test]
    fn test_apply_row_vector_convention() {
        let t = Transformation::new(rot_z_90(), [2.0, 3.0, 0.0]);
        let out = t.apply(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(out[0], [2.0, 4.0, 0.0]);
        assert_eq!(out[1], [1.0, 3.0, 0.0]);
    }

    #[test]
    fn test_apply_to_provider() {
        let t = Transformation::new(IDENTITY3, [1.0, 0.0, 0.0]);
        let mut mol: Vec<Coord> = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        let updated = t.apply_to(&mut mol).unwrap();
        assert_eq!(updated[1], [2.0, 1.0, 1.0]);
        assert_eq!(mol[0], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_proper_rotation_check() {
        assert!(Transformation::new(rot_z_90(), [0.0; 3]).is_proper_rotation(1e-12));
        let mirror = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]];
        assert!(!Transformation::new(mirror, [0.0; 3]).is_proper_rotation(1e-6));
    }

    #[test]
    fn test_then_composes() {
        let a = Transformation::new(rot_z_90(), [1.0, 0.0, 0.0]);
        let b = Transformation::new(rot_z_90(), [0.0, 2.0, 0.0]);
        let p = [0.3, -0.7, 1.1];
        let composed = a.then(&b).apply_point(&p);
        let stepwise = b.apply_point(&a.apply_point(&p));
        for k in 0..3 {
            assert!((composed[k] - stepwise[k]).abs() < 1e-12);
        }
    }
}

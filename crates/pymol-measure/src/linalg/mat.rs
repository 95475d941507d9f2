//! 3×3 row-major matrix and 3-vector helpers
//!
//! Matrices are `m[row][col]`. Vectors multiply either from the left
//! ([`vec_mat`], row-vector convention used by [`Transformation`]) or from the
//! right ([`mat_vec`]).
//!
//! [`Transformation`]: crate::Transformation

/// 3×3 row-major matrix
pub type Mat3 = [[f64; 3]; 3];

pub const IDENTITY3: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Determinant by cofactor expansion along the first row
pub fn det3(m: &Mat3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

pub fn transpose3(m: &Mat3) -> Mat3 {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

/// C = A · B
pub fn mat_mul3(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut c = [[0.0f64; 3]; 3];
    for row in 0..3 {
        for col in 0..3 {
            c[row][col] = a[row][0] * b[0][col] + a[row][1] * b[1][col] + a[row][2] * b[2][col];
        }
    }
    c
}

/// A · v (column vector)
pub fn mat_vec(a: &Mat3, v: &[f64; 3]) -> [f64; 3] {
    [
        a[0][0] * v[0] + a[0][1] * v[1] + a[0][2] * v[2],
        a[1][0] * v[0] + a[1][1] * v[1] + a[1][2] * v[2],
        a[2][0] * v[0] + a[2][1] * v[1] + a[2][2] * v[2],
    ]
}

/// v · A (row vector)
pub fn vec_mat(v: &[f64; 3], a: &Mat3) -> [f64; 3] {
    [
        v[0] * a[0][0] + v[1] * a[1][0] + v[2] * a[2][0],
        v[0] * a[0][1] + v[1] * a[1][1] + v[2] * a[2][1],
        v[0] * a[0][2] + v[1] * a[1][2] + v[2] * a[2][2],
    ]
}

/// Column `j` of a matrix
pub fn column(m: &Mat3, j: usize) -> [f64; 3] {
    [m[0][j], m[1][j], m[2][j]]
}

/// Build a matrix from its three columns
pub fn from_columns(cols: &[[f64; 3]; 3]) -> Mat3 {
    [
        [cols[0][0], cols[1][0], cols[2][0]],
        [cols[0][1], cols[1][1], cols[2][1]],
        [cols[0][2], cols[1][2], cols[2][2]],
    ]
}

/// Symmetric matrix from an (xx, yy, zz, xy, xz, yz) record
pub fn symmetric_from_record(r: &[f64; 6]) -> Mat3 {
    [[r[0], r[3], r[4]], [r[3], r[1], r[5]], [r[4], r[5], r[2]]]
}

pub fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn scale(v: &[f64; 3], s: f64) -> [f64; 3] {
    [v[0] * s, v[1] * s, v[2] * s]
}

/// Normalize in place; vectors shorter than 1e-300 are left untouched
pub fn normalize(v: &mut [f64; 3]) -> f64 {
    let len = dot(v, v).sqrt();
    if len > 1e-300 {
        v[0] /= len;
        v[1] /= len;
        v[2] /= len;
    }
    len
}

/// Unit vector perpendicular to `v` (which must be non-zero)
pub fn arbitrary_perpendicular(v: &[f64; 3]) -> [f64; 3] {
    let candidate = if v[0].abs() < v[1].abs() && v[0].abs() < v[2].abs() {
        [1.0, 0.0, 0.0]
    } else if v[1].abs() < v[2].abs() {
        [0.0, 1.0, 0.0]
    } else {
        [0.0, 0.0, 1.0]
    };
    let mut perp = cross(v, &candidate);
    normalize(&mut perp);
    perp
}

/// Embed a rotation and a translation into a 4×4 homogeneous matrix
///
/// Top-left 3×3 is `rotation` as stored, column 3 holds `translation`, the
/// bottom row is `[0, 0, 0, 1]`.
pub fn homogeneous(rotation: &Mat3, translation: &[f64; 3]) -> [[f64; 4]; 4] {
    let mut out = [[0.0f64; 4]; 4];
    for row in 0..3 {
        out[row][..3].copy_from_slice(&rotation[row]);
        out[row][3] = translation[row];
    }
    out[3][3] = 1.0;
    out
}

/// Largest absolute element-wise difference between two matrices
pub fn max_abs_diff(a: &Mat3, b: &Mat3) -> f64 {
    let mut max = 0.0f64;
    for row in 0..3 {
        for col in 0..3 {
            max = max.max((a[row][col] - b[row][col]).abs());
        }
    }
    max
}

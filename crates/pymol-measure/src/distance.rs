//! Point-wise distances and deformation vectors

use crate::coords::{distance_sq, Coord, CoordStack};
use crate::error::{check_same_len, MeasureError, MeasureResult};

/// Euclidean distance between corresponding points of two sets
pub fn calc_distance(one: &[Coord], two: &[Coord]) -> MeasureResult<Vec<f64>> {
    check_same_len(one.len(), two.len())?;
    Ok(one.iter().zip(two).map(|(a, b)| distance_sq(a, b).sqrt()).collect())
}

/// Per-frame point distances between two stacks of the same shape
///
/// Returns one vector of `n_atoms` distances per frame.
pub fn calc_distance_stack(one: &CoordStack, two: &CoordStack) -> MeasureResult<Vec<Vec<f64>>> {
    if one.n_frames() != two.n_frames() {
        return Err(MeasureError::FrameCount {
            expected: one.n_frames(),
            actual: two.n_frames(),
        });
    }
    check_same_len(one.n_atoms(), two.n_atoms())?;
    one.frames().zip(two.frames()).map(|(a, b)| calc_distance(a, b)).collect()
}

/// Flattened displacement `to − from`, three values per point
pub fn calc_deform_vector(from: &[Coord], to: &[Coord]) -> MeasureResult<Vec<f64>> {
    check_same_len(from.len(), to.len())?;
    Ok(from
        .iter()
        .zip(to)
        .flat_map(|(a, b)| [b[0] - a[0], b[1] - a[1], b[2] - a[2]])
        .collect())
}

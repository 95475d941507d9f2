//! Radius of gyration

use rayon::prelude::*;

use crate::config::ExecutionPolicy;
use crate::coords::{centroid, distance_sq, Coord, CoordStack};
use crate::error::{check_weights, MeasureError, MeasureResult};

fn frame_rg(coords: &[Coord], weights: Option<&[f64]>) -> f64 {
    let c = centroid(coords, weights);
    match weights {
        None => {
            let sum: f64 = coords.iter().map(|p| distance_sq(p, &c)).sum();
            (sum / coords.len() as f64).sqrt()
        }
        Some(w) => {
            let sum: f64 = coords.iter().zip(w).map(|(p, wi)| wi * distance_sq(p, &c)).sum();
            (sum / w.iter().sum::<f64>()).sqrt()
        }
    }
}

/// Radius of gyration of one frame
///
/// With weights (typically masses) the centroid is `Σ(w·x)/Σw` and
/// `Rg = sqrt(Σ w·‖x − c‖² / Σw)`; without, both reduce to plain means.
pub fn calc_radius_of_gyration(coords: &[Coord], weights: Option<&[f64]>) -> MeasureResult<f64> {
    if coords.is_empty() {
        return Err(MeasureError::EmptyCoordinates);
    }
    check_weights(weights, coords.len())?;
    Ok(frame_rg(coords, weights))
}

/// Radius of gyration of every frame in a stack
pub fn calc_radius_of_gyration_stack(stack: &CoordStack, weights: Option<&[f64]>) -> MeasureResult<Vec<f64>> {
    calc_radius_of_gyration_stack_with(&ExecutionPolicy::default(), stack, weights)
}

/// [`calc_radius_of_gyration_stack`] under an explicit execution policy
pub fn calc_radius_of_gyration_stack_with(
    policy: &ExecutionPolicy,
    stack: &CoordStack,
    weights: Option<&[f64]>,
) -> MeasureResult<Vec<f64>> {
    if stack.is_empty() {
        return Ok(Vec::new());
    }
    if stack.n_atoms() == 0 {
        return Err(MeasureError::EmptyCoordinates);
    }
    check_weights(weights, stack.n_atoms())?;

    let out: Vec<f64> = if policy.use_parallel(stack.n_frames()) {
        stack.par_frames().map(|frame| frame_rg(frame, weights)).collect()
    } else {
        stack.frames().map(|frame| frame_rg(frame, weights)).collect()
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::Transformation;

    #[test]
    fn test_two_point_unit() {
        let coords = [[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        assert_eq!(calc_radius_of_gyration(&coords, None).unwrap(), 1.0);
        assert_eq!(calc_radius_of_gyration(&coords, Some(&[1.0, 1.0])).unwrap(), 1.0);
    }

    #[test]
    fn test_mass_weighted() {
        // Centroid at x = 0.5, deviations 1.5 and 0.5
        let coords = [[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let rg = calc_radius_of_gyration(&coords, Some(&[1.0, 3.0])).unwrap();
        let expected = ((1.0 * 2.25 + 3.0 * 0.25) / 4.0f64).sqrt();
        assert!((rg - expected).abs() < 1e-12);
    }

    #[test]
    fn test_rigid_invariance() {
        let coords = vec![[0.0, 0.0, 0.0], [1.5, 0.2, 0.0], [0.3, 1.1, -0.7], [2.0, -1.0, 0.4]];
        let (s, c) = 1.1f64.sin_cos();
        let t = Transformation::new([[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]], [4.0, -2.0, 9.0]);
        let moved = t.apply(&coords);
        let a = calc_radius_of_gyration(&coords, None).unwrap();
        let b = calc_radius_of_gyration(&moved, None).unwrap();
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_stack() {
        let stack = CoordStack::from_frames(vec![
            vec![[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            vec![[0.0, -2.0, 0.0], [0.0, 2.0, 0.0]],
        ])
        .unwrap();
        let out = calc_radius_of_gyration_stack(&stack, None).unwrap();
        assert_eq!(out, vec![1.0, 2.0]);
        assert!(calc_radius_of_gyration_stack(&stack, Some(&[1.0])).unwrap_err().is_shape_error());
    }

    #[test]
    fn test_empty() {
        assert_eq!(calc_radius_of_gyration(&[], None), Err(MeasureError::EmptyCoordinates));
        assert!(calc_radius_of_gyration_stack(&CoordStack::default(), None).unwrap().is_empty());
    }
}

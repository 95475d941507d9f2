//! Root-mean-square deviation between corresponding point sets
//!
//! No superposition is performed; callers align first when they need the
//! fitted deviation.

use rayon::prelude::*;

use crate::config::ExecutionPolicy;
use crate::coords::{distance_sq, Coord, CoordStack};
use crate::error::{check_same_len, check_weights, MeasureError, MeasureResult};

/// Weights for a stack RMSD calculation
#[derive(Debug, Clone, Copy, Default)]
pub enum StackWeights<'a> {
    /// Every atom counts equally
    #[default]
    None,
    /// One weight per atom, shared by all frames
    Shared(&'a [f64]),
    /// One weight vector per frame
    PerFrame(&'a [Vec<f64>]),
}

impl<'a> StackWeights<'a> {
    fn for_frame(&self, index: usize) -> Option<&'a [f64]> {
        match *self {
            StackWeights::None => None,
            StackWeights::Shared(w) => Some(w),
            StackWeights::PerFrame(w) => Some(w[index].as_slice()),
        }
    }

    fn validate(&self, n_frames: usize, n_atoms: usize) -> MeasureResult<()> {
        match *self {
            StackWeights::None => Ok(()),
            StackWeights::Shared(w) => check_weights(Some(w), n_atoms),
            StackWeights::PerFrame(w) => {
                if w.len() != n_frames {
                    return Err(MeasureError::FrameCount {
                        expected: n_frames,
                        actual: w.len(),
                    });
                }
                w.iter().try_for_each(|frame| check_weights(Some(frame), n_atoms))
            }
        }
    }
}

/// RMSD of two validated frames
fn frame_rmsd(reference: &[Coord], target: &[Coord], weights: Option<&[f64]>) -> f64 {
    match weights {
        None => {
            let sum: f64 = reference.iter().zip(target).map(|(a, b)| distance_sq(a, b)).sum();
            (sum / reference.len() as f64).sqrt()
        }
        Some(w) => {
            let sum: f64 = reference
                .iter()
                .zip(target)
                .zip(w)
                .map(|((a, b), wi)| wi * distance_sq(a, b))
                .sum();
            (sum / w.iter().sum::<f64>()).sqrt()
        }
    }
}

/// RMSD between `reference` and `target`, optionally weighted
///
/// Unweighted: `sqrt(Σ‖ref − tgt‖² / N)`. Weighted: `sqrt(Σ w·‖ref − tgt‖² / Σw)`.
pub fn calc_rmsd(reference: &[Coord], target: &[Coord], weights: Option<&[f64]>) -> MeasureResult<f64> {
    check_same_len(reference.len(), target.len())?;
    if reference.is_empty() {
        return Err(MeasureError::EmptyCoordinates);
    }
    check_weights(weights, reference.len())?;
    Ok(frame_rmsd(reference, target, weights))
}

/// Per-frame RMSD of every frame in `targets` against `reference`
pub fn calc_rmsd_stack(
    reference: &[Coord],
    targets: &CoordStack,
    weights: StackWeights<'_>,
) -> MeasureResult<Vec<f64>> {
    calc_rmsd_stack_with(&ExecutionPolicy::default(), reference, targets, weights)
}

/// [`calc_rmsd_stack`] under an explicit execution policy
pub fn calc_rmsd_stack_with(
    policy: &ExecutionPolicy,
    reference: &[Coord],
    targets: &CoordStack,
    weights: StackWeights<'_>,
) -> MeasureResult<Vec<f64>> {
    if reference.is_empty() {
        return Err(MeasureError::EmptyCoordinates);
    }
    if !targets.is_empty() {
        check_same_len(reference.len(), targets.n_atoms())?;
    }
    weights.validate(targets.n_frames(), reference.len())?;

    let rmsd = |(i, frame): (usize, &[Coord])| frame_rmsd(reference, frame, weights.for_frame(i));
    let out: Vec<f64> = if policy.use_parallel(targets.n_frames()) {
        log::debug!("Computing RMSD for {} frames in parallel", targets.n_frames());
        targets.par_frames().enumerate().map(rmsd).collect()
    } else {
        targets.frames().enumerate().map(rmsd).collect()
    };
    Ok(out)
}

//! Superposition of many frames onto one fixed target
//!
//! The target is centered once; each frame then costs one centering pass and
//! one 3×3 SVD. Frames are independent and run in parallel when the
//! execution policy allows it.

use rayon::prelude::*;

use crate::coords::{Coord, CoordStack};
use crate::error::{MeasureError, MeasureResult};
use crate::linalg::LinearAlgebra;

use super::kabsch::{check_pair, solve, Aligner, Centered};
use super::transform::Transformation;

impl<L: LinearAlgebra> Aligner<L> {
    /// Superpose every frame of `mobiles` onto `target`, in place.
    ///
    /// Returns one transformation per frame, in frame order.
    pub fn superpose_stack(
        &self,
        mobiles: &mut CoordStack,
        target: &[Coord],
        weights: Option<&[f64]>,
    ) -> MeasureResult<Vec<Transformation>> {
        if mobiles.is_empty() {
            return Ok(Vec::new());
        }
        check_pair(mobiles.n_atoms(), target.len(), weights)?;
        log::debug!(
            "Superposing {} frames of {} atoms in place",
            mobiles.n_frames(),
            mobiles.n_atoms()
        );

        let target = Centered::new(target, weights);
        let backend = self.backend();
        let fit = |frame: &mut [Coord]| {
            let t = solve(backend, frame, &target, weights);
            t.apply_in_place(frame);
            t
        };
        let transforms: Vec<Transformation> = if self.execution_policy().use_parallel(mobiles.n_frames()) {
            mobiles.par_frames_mut().map(fit).collect()
        } else {
            mobiles.frames_mut().map(fit).collect()
        };
        Ok(transforms)
    }

    /// Fit each frame of `mobiles` onto `target` and apply the resulting
    /// transformation to the frame with the same index in `moves`.
    ///
    /// `mobiles` is left untouched. `moves` must have the same number of
    /// frames but may hold any number of atoms per frame, e.g. the full
    /// structure while `mobiles` holds only the Cα trace.
    pub fn superpose_stack_into(
        &self,
        mobiles: &CoordStack,
        target: &[Coord],
        weights: Option<&[f64]>,
        moves: &mut CoordStack,
    ) -> MeasureResult<Vec<Transformation>> {
        if moves.n_frames() != mobiles.n_frames() {
            return Err(MeasureError::FrameCount {
                expected: mobiles.n_frames(),
                actual: moves.n_frames(),
            });
        }
        if mobiles.is_empty() {
            return Ok(Vec::new());
        }
        check_pair(mobiles.n_atoms(), target.len(), weights)?;
        log::debug!(
            "Superposing {} frames of {} atoms, moving {} atoms per frame",
            mobiles.n_frames(),
            mobiles.n_atoms(),
            moves.n_atoms()
        );

        let target = Centered::new(target, weights);
        let transforms = self.fit_frames(mobiles, &target, weights);
        self.apply_frames(moves, &transforms);
        Ok(transforms)
    }

    /// Superpose all frames of an ensemble onto one of its own frames.
    ///
    /// Transformations are computed from the atoms listed in `subset` (all
    /// atoms when `None`) and applied to every atom of each frame. The
    /// reference frame is left as it is. Returns `None` when the stack holds
    /// fewer than two frames.
    pub fn align_coordsets(
        &self,
        stack: &mut CoordStack,
        reference_frame: usize,
        subset: Option<&[usize]>,
        weights: Option<&[f64]>,
    ) -> MeasureResult<Option<Vec<Transformation>>> {
        if stack.n_frames() < 2 {
            log::warn!(
                "Ensemble contains only {} coordinate set(s), superposition not performed",
                stack.n_frames()
            );
            return Ok(None);
        }
        if reference_frame >= stack.n_frames() {
            return Err(MeasureError::IndexOutOfBounds {
                index: reference_frame,
                len: stack.n_frames(),
            });
        }
        let n_atoms = stack.n_atoms();
        if let Some(&bad) = subset.and_then(|s| s.iter().find(|&&i| i >= n_atoms)) {
            return Err(MeasureError::IndexOutOfBounds {
                index: bad,
                len: n_atoms,
            });
        }

        let mobiles = match subset {
            Some(indices) => CoordStack::from_frames(
                stack
                    .frames()
                    .map(|frame| indices.iter().map(|&i| frame[i]).collect::<Vec<_>>()),
            )?,
            None => stack.clone(),
        };
        let target_coords = mobiles
            .frame(reference_frame)
            .ok_or(MeasureError::IndexOutOfBounds {
                index: reference_frame,
                len: mobiles.n_frames(),
            })?;
        check_pair(mobiles.n_atoms(), target_coords.len(), weights)?;

        let target = Centered::new(target_coords, weights);
        let mut transforms = self.fit_frames(&mobiles, &target, weights);
        transforms[reference_frame] = Transformation::identity();
        self.apply_frames(stack, &transforms);
        Ok(Some(transforms))
    }

    /// Solve every frame against a pre-centered target
    fn fit_frames(
        &self,
        mobiles: &CoordStack,
        target: &Centered,
        weights: Option<&[f64]>,
    ) -> Vec<Transformation> {
        let backend = self.backend();
        if self.execution_policy().use_parallel(mobiles.n_frames()) {
            mobiles
                .par_frames()
                .map(|frame| solve(backend, frame, target, weights))
                .collect()
        } else {
            mobiles
                .frames()
                .map(|frame| solve(backend, frame, target, weights))
                .collect()
        }
    }

    /// Apply `transforms[i]` to frame `i` of `moves`
    fn apply_frames(&self, moves: &mut CoordStack, transforms: &[Transformation]) {
        if moves.n_atoms() == 0 {
            return;
        }
        if self.execution_policy().use_parallel(moves.n_frames()) {
            moves
                .par_frames_mut()
                .zip(transforms.par_iter())
                .for_each(|(frame, t)| t.apply_in_place(frame));
        } else {
            for (frame, t) in moves.frames_mut().zip(transforms) {
                t.apply_in_place(frame);
            }
        }
    }
}

/// [`Aligner::superpose_stack`] with the default provider
pub fn superpose_stack(
    mobiles: &mut CoordStack,
    target: &[Coord],
    weights: Option<&[f64]>,
) -> MeasureResult<Vec<Transformation>> {
    Aligner::new().superpose_stack(mobiles, target, weights)
}

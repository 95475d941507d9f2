//! Coordinate containers and the coordinate-provider boundary
//!
//! The numeric core only ever sees raw `[f64; 3]` slices. Structure-like
//! objects participate through [`CoordinateProvider`] and are resolved to an
//! array once, at the call boundary, via [`Coordinates`].

use std::borrow::Cow;

use rayon::slice::{ChunksExact, ChunksExactMut, ParallelSlice, ParallelSliceMut};

use crate::error::{MeasureError, MeasureResult};

/// A single 3-D point
pub type Coord = [f64; 3];

/// Symmetric tensor record in (xx, yy, zz, xy, xz, yz) order
pub type TensorRecord = [f64; 6];

/// Anything that owns an active coordinate set (molecule, selection, ...)
pub trait CoordinateProvider {
    /// Copy of the active coordinate set
    fn coordinates(&self) -> Vec<Coord>;

    /// Replace the active coordinate set
    fn set_coordinates(&mut self, coords: Vec<Coord>) -> MeasureResult<()>;
}

/// Source of per-atom anisotropic temperature factors
pub trait AnisouProvider {
    /// One tensor record per atom, or `None` when the data was never set
    fn aniso_temp_factors(&self) -> Option<Vec<TensorRecord>>;
}

/// Read-only coordinate input: either a raw array or a provider
#[derive(Clone, Copy)]
pub enum Coordinates<'a> {
    Array(&'a [Coord]),
    Provider(&'a dyn CoordinateProvider),
}

impl<'a> Coordinates<'a> {
    /// Resolve to a coordinate array, copying only for providers
    pub fn resolve(&self) -> Cow<'a, [Coord]> {
        match *self {
            Coordinates::Array(coords) => Cow::Borrowed(coords),
            Coordinates::Provider(provider) => Cow::Owned(provider.coordinates()),
        }
    }
}

impl<'a> From<&'a [Coord]> for Coordinates<'a> {
    fn from(coords: &'a [Coord]) -> Self {
        Coordinates::Array(coords)
    }
}

impl<'a> From<&'a Vec<Coord>> for Coordinates<'a> {
    fn from(coords: &'a Vec<Coord>) -> Self {
        Coordinates::Array(coords.as_slice())
    }
}

impl<'a, const N: usize> From<&'a [Coord; N]> for Coordinates<'a> {
    fn from(coords: &'a [Coord; N]) -> Self {
        Coordinates::Array(coords.as_slice())
    }
}

impl std::fmt::Debug for Coordinates<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Coordinates::Array(coords) => f.debug_tuple("Array").field(&coords.len()).finish(),
            Coordinates::Provider(_) => f.write_str("Provider"),
        }
    }
}

impl CoordinateProvider for Vec<Coord> {
    fn coordinates(&self) -> Vec<Coord> {
        self.clone()
    }

    fn set_coordinates(&mut self, coords: Vec<Coord>) -> MeasureResult<()> {
        if coords.len() != self.len() {
            return Err(MeasureError::LengthMismatch(self.len(), coords.len()));
        }
        *self = coords;
        Ok(())
    }
}

/// Stack of frames sharing the same atom count
///
/// Frames are stored contiguously: frame `i` occupies
/// `coords[i * n_atoms..(i + 1) * n_atoms]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordStack {
    coords: Vec<Coord>,
    n_atoms: usize,
    n_frames: usize,
}

impl CoordStack {
    /// Create a stack from a flat array of `n_frames * n_atoms` points
    pub fn new(coords: Vec<Coord>, n_atoms: usize) -> MeasureResult<Self> {
        if n_atoms == 0 {
            if !coords.is_empty() {
                return Err(MeasureError::invalid_shape(
                    "coordinate stack",
                    format!("{} points cannot form frames of 0 atoms", coords.len()),
                ));
            }
            return Ok(CoordStack::default());
        }
        if coords.len() % n_atoms != 0 {
            return Err(MeasureError::invalid_shape(
                "coordinate stack",
                format!("{} points is not a multiple of {} atoms", coords.len(), n_atoms),
            ));
        }
        let n_frames = coords.len() / n_atoms;
        Ok(CoordStack {
            coords,
            n_atoms,
            n_frames,
        })
    }

    /// Create a stack from individual frames; all frames must have the same length
    pub fn from_frames<I>(frames: I) -> MeasureResult<Self>
    where
        I: IntoIterator<Item = Vec<Coord>>,
    {
        let mut coords = Vec::new();
        let mut n_atoms = None;
        let mut n_frames = 0;
        for frame in frames {
            match n_atoms {
                None => n_atoms = Some(frame.len()),
                Some(n) if n != frame.len() => {
                    return Err(MeasureError::invalid_shape(
                        "coordinate stack",
                        format!("frame {} has {} atoms, expected {}", n_frames, frame.len(), n),
                    ));
                }
                _ => {}
            }
            coords.extend(frame);
            n_frames += 1;
        }
        Ok(CoordStack {
            coords,
            n_atoms: n_atoms.unwrap_or(0),
            n_frames,
        })
    }

    /// Number of frames
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// Number of atoms per frame
    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    pub fn is_empty(&self) -> bool {
        self.n_frames == 0
    }

    /// Get a frame by index
    pub fn frame(&self, index: usize) -> Option<&[Coord]> {
        (index < self.n_frames).then(|| &self.coords[index * self.n_atoms..(index + 1) * self.n_atoms])
    }

    /// Get a mutable frame by index
    pub fn frame_mut(&mut self, index: usize) -> Option<&mut [Coord]> {
        let n = self.n_atoms;
        if index < self.n_frames {
            Some(&mut self.coords[index * n..(index + 1) * n])
        } else {
            None
        }
    }

    /// Iterate over frames in order
    pub fn frames(&self) -> impl ExactSizeIterator<Item = &[Coord]> + '_ {
        (0..self.n_frames).map(move |i| &self.coords[i * self.n_atoms..(i + 1) * self.n_atoms])
    }

    /// All points, frame after frame
    pub fn as_slice(&self) -> &[Coord] {
        &self.coords
    }

    /// Split back into individual frames
    pub fn into_frames(self) -> Vec<Vec<Coord>> {
        self.frames().map(|f| f.to_vec()).collect()
    }

    /// Parallel frame iterator; requires `n_atoms > 0`
    pub(crate) fn par_frames(&self) -> ChunksExact<'_, Coord> {
        debug_assert!(self.n_atoms > 0);
        self.coords.par_chunks_exact(self.n_atoms)
    }

    /// Parallel mutable frame iterator; requires `n_atoms > 0`
    pub(crate) fn par_frames_mut(&mut self) -> ChunksExactMut<'_, Coord> {
        debug_assert!(self.n_atoms > 0);
        self.coords.par_chunks_exact_mut(self.n_atoms)
    }

    /// Sequential mutable frame iterator; requires `n_atoms > 0`
    pub(crate) fn frames_mut(&mut self) -> std::slice::ChunksExactMut<'_, Coord> {
        debug_assert!(self.n_atoms > 0);
        self.coords.chunks_exact_mut(self.n_atoms)
    }
}

/// Weighted (or plain) centroid of a coordinate set
///
/// Callers guarantee `coords` is non-empty and `weights`, when given, has the
/// same length.
pub fn centroid(coords: &[Coord], weights: Option<&[f64]>) -> Coord {
    let mut sum = [0.0f64; 3];
    let total = match weights {
        Some(w) => {
            for (c, &wi) in coords.iter().zip(w) {
                for k in 0..3 {
                    sum[k] += wi * c[k];
                }
            }
            w.iter().sum::<f64>()
        }
        None => {
            for c in coords {
                for k in 0..3 {
                    sum[k] += c[k];
                }
            }
            coords.len() as f64
        }
    };
    [sum[0] / total, sum[1] / total, sum[2] / total]
}

/// Squared Euclidean distance between two points
#[inline]
pub(crate) fn distance_sq(a: &Coord, b: &Coord) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

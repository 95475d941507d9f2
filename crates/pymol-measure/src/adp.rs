//! Anisotropic displacement parameters
//!
//! Each atom carries a symmetric 3×3 tensor stored as an
//! (xx, yy, zz, xy, xz, yz) record. Its eigendecomposition gives the
//! principal displacement axes; scaling each unit axis by the square root of
//! its eigenvalue gives a vector whose length is the standard deviation along
//! that axis.
//!
//! Eigenvectors carry an arbitrary sign. [`AdpAnalyzer::calc_adp_axes`] makes
//! consecutive atoms agree by flipping each axis to point the same way as the
//! corresponding axis of the previous atom, which keeps the field smooth along
//! a chain. The result depends on atom order.

use rayon::prelude::*;

use crate::config::ExecutionPolicy;
use crate::coords::{AnisouProvider, TensorRecord};
use crate::error::{MeasureError, MeasureResult};
use crate::linalg::mat::{column, dot, from_columns, scale, symmetric_from_record, Mat3};
use crate::linalg::{Eigen3, Jacobi, LinearAlgebra};

const ANISOU: &str = "anisotropic temperature factors";

/// Which minor eigenvalue a ratio filter compares against the largest one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioAxis {
    /// Second largest eigenvalue
    Second,
    /// Smallest eigenvalue
    Smallest,
}

impl RatioAxis {
    fn index(self) -> usize {
        match self {
            RatioAxis::Second => 1,
            RatioAxis::Smallest => 2,
        }
    }
}

/// Anisotropy filter that zeroes the axes of insufficiently anisotropic atoms
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AnisotropyFilter {
    #[default]
    None,
    /// Zero an atom when `λ₁ / (λ₁ + λ₂ + λ₃)` is below the threshold
    Fraction(f64),
    /// Zero an atom when `λ_axis / λ₁` is at or below the threshold
    Ratio { axis: RatioAxis, value: f64 },
}

impl AnisotropyFilter {
    /// Check the threshold range
    pub fn validate(&self) -> MeasureResult<()> {
        match *self {
            AnisotropyFilter::None => Ok(()),
            AnisotropyFilter::Fraction(f) => {
                if f > 0.33 && f < 1.0 {
                    Ok(())
                } else {
                    Err(MeasureError::invalid_parameter(
                        "fract",
                        format!("must be > 0.33 and < 1.0, got {}", f),
                    ))
                }
            }
            AnisotropyFilter::Ratio { axis, value } => {
                if value > 0.0 && value < 1.0 {
                    Ok(())
                } else {
                    let name = match axis {
                        RatioAxis::Second => "ratio2",
                        RatioAxis::Smallest => "ratio",
                    };
                    Err(MeasureError::invalid_parameter(
                        name,
                        format!("must be > 0 and < 1.0, got {}", value),
                    ))
                }
            }
        }
    }

    /// Build a validated filter from optional keyword-style thresholds
    ///
    /// At most one filter is applied. When several are given, `fract` wins,
    /// then `ratio2`, then `ratio`, then `ratio3`. `ratio` and `ratio3` both
    /// compare the smallest eigenvalue.
    pub fn from_options(
        fract: Option<f64>,
        ratio: Option<f64>,
        ratio2: Option<f64>,
        ratio3: Option<f64>,
    ) -> MeasureResult<Self> {
        let filter = if let Some(f) = fract {
            AnisotropyFilter::Fraction(f)
        } else if let Some(value) = ratio2 {
            AnisotropyFilter::Ratio {
                axis: RatioAxis::Second,
                value,
            }
        } else if let Some(value) = ratio.or(ratio3) {
            AnisotropyFilter::Ratio {
                axis: RatioAxis::Smallest,
                value,
            }
        } else {
            AnisotropyFilter::None
        };
        filter.validate()?;
        Ok(filter)
    }

    /// True when an atom with descending eigenvalues `values` must be zeroed
    fn rejects(&self, values: &[f64; 3]) -> bool {
        match *self {
            AnisotropyFilter::None => false,
            AnisotropyFilter::Fraction(f) => {
                let total: f64 = values.iter().sum();
                total > 0.0 && values[0] / total < f
            }
            AnisotropyFilter::Ratio { axis, value } => values[0] > 0.0 && values[axis.index()] / values[0] <= value,
        }
    }
}

/// Principal axes of a set of atoms
#[derive(Debug, Clone, PartialEq)]
pub struct AdpAxes {
    /// Per-atom 3×3 matrices, columns are the scaled axes, largest first
    pub axes: Vec<Mat3>,
    /// Per-atom eigenvalues after clamping negatives to zero, descending
    pub variances: Vec<[f64; 3]>,
}

impl AdpAxes {
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Standard deviations along each axis (square roots of the variances)
    pub fn stddevs(&self) -> Vec<[f64; 3]> {
        self.variances.iter().map(|v| [v[0].sqrt(), v[1].sqrt(), v[2].sqrt()]).collect()
    }

    /// Stack the matrices into 3N rows of 3 columns
    pub fn to_stacked(&self) -> Vec<[f64; 3]> {
        self.axes.iter().flat_map(|m| m.iter().copied()).collect()
    }
}

/// Eigendecomposition of one anisotropic record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adp {
    /// Eigenvalues, descending, not clamped
    pub values: [f64; 3],
    /// Unit eigenvectors as columns, in the order of `values`
    pub vectors: Mat3,
}

/// Block-diagonal 3N×3N matrix of per-atom tensors
#[derive(Debug, Clone, PartialEq)]
pub struct AdpMatrix {
    dim: usize,
    data: Vec<f64>,
}

impl AdpMatrix {
    /// Number of rows (and columns): three per atom
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.dim && col < self.dim).then(|| self.data[row * self.dim + col])
    }

    /// Diagonal 3×3 block of atom `atom`
    pub fn block(&self, atom: usize) -> Option<Mat3> {
        if atom * 3 >= self.dim {
            return None;
        }
        let mut out = [[0.0f64; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            let start = (atom * 3 + r) * self.dim + atom * 3;
            row.copy_from_slice(&self.data[start..start + 3]);
        }
        Some(out)
    }

    /// Row-major elements
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.dim.max(1))
    }
}

/// Eigendecomposition engine for anisotropic temperature factors
#[derive(Debug, Clone, Default)]
pub struct AdpAnalyzer<L = Jacobi> {
    backend: L,
    policy: ExecutionPolicy,
}

impl AdpAnalyzer<Jacobi> {
    pub fn new() -> Self {
        Self::with_backend(Jacobi)
    }
}

impl<L: LinearAlgebra> AdpAnalyzer<L> {
    pub fn with_backend(backend: L) -> Self {
        AdpAnalyzer {
            backend,
            policy: ExecutionPolicy::default(),
        }
    }

    /// Enable or disable parallel decomposition of atoms
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.policy.parallel = parallel;
        self
    }

    pub fn policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Decompose one record
    pub fn calc_adps(&self, record: &TensorRecord) -> Adp {
        let Eigen3 { values, vectors } = self.backend.symmetric_eigen3(&symmetric_from_record(record));
        Adp { values, vectors }
    }

    /// Principal axes of every record, sign-aligned along the atom order and
    /// filtered by anisotropy.
    pub fn calc_adp_axes(&self, records: &[TensorRecord], filter: AnisotropyFilter) -> MeasureResult<AdpAxes> {
        filter.validate()?;
        let n = records.len();

        let decompose = |record: &TensorRecord| {
            let mut adp = self.calc_adps(record);
            for v in adp.values.iter_mut() {
                *v = v.max(0.0);
            }
            adp
        };
        let decomposed: Vec<Adp> = if self.policy.use_parallel(n) {
            records.par_iter().map(decompose).collect()
        } else {
            records.iter().map(decompose).collect()
        };

        let oriented = orient_consecutive(decomposed.iter().map(|adp| adp.vectors));

        let mut rejected = 0usize;
        let axes = decomposed
            .iter()
            .zip(&oriented)
            .map(|(adp, unit)| {
                if filter.rejects(&adp.values) {
                    rejected += 1;
                    return [[0.0f64; 3]; 3];
                }
                from_columns(&[
                    scale(&column(unit, 0), adp.values[0].sqrt()),
                    scale(&column(unit, 1), adp.values[1].sqrt()),
                    scale(&column(unit, 2), adp.values[2].sqrt()),
                ])
            })
            .collect();
        if rejected > 0 {
            log::debug!("Anisotropy filter {:?} zeroed {} of {} atoms", filter, rejected, n);
        }

        Ok(AdpAxes {
            axes,
            variances: decomposed.iter().map(|adp| adp.values).collect(),
        })
    }

    /// [`calc_adp_axes`](Self::calc_adp_axes) on the tensors of a provider
    pub fn calc_adp_axes_from<P>(&self, atoms: &P, filter: AnisotropyFilter) -> MeasureResult<AdpAxes>
    where
        P: AnisouProvider + ?Sized,
    {
        let records = atoms.aniso_temp_factors().ok_or(MeasureError::MissingData(ANISOU))?;
        self.calc_adp_axes(&records, filter)
    }
}

/// Orient unit axes so that each one points the same way as the matching
/// axis of the previous atom.
///
/// The first atom keeps its signs. An axis is negated when its dot product
/// with the previous oriented axis is negative; a zero dot product keeps it.
fn orient_consecutive<I>(vectors: I) -> Vec<Mat3>
where
    I: IntoIterator<Item = Mat3>,
{
    vectors
        .into_iter()
        .fold(Vec::new(), |mut oriented: Vec<Mat3>, raw| {
            let next = match oriented.last() {
                None => raw,
                Some(prev) => {
                    let mut cols = [column(&raw, 0), column(&raw, 1), column(&raw, 2)];
                    for (j, col) in cols.iter_mut().enumerate() {
                        if dot(col, &column(prev, j)) < 0.0 {
                            *col = scale(col, -1.0);
                        }
                    }
                    from_columns(&cols)
                }
            };
            oriented.push(next);
            oriented
        })
}

/// Block-diagonal 3N×3N matrix holding each record as a symmetric 3×3 block
pub fn build_adp_matrix(records: &[TensorRecord]) -> AdpMatrix {
    let dim = records.len() * 3;
    let mut data = vec![0.0f64; dim * dim];
    for (i, record) in records.iter().enumerate() {
        let block = symmetric_from_record(record);
        for (r, row) in block.iter().enumerate() {
            let start = (i * 3 + r) * dim + i * 3;
            data[start..start + 3].copy_from_slice(row);
        }
    }
    AdpMatrix { dim, data }
}

/// [`build_adp_matrix`] on the tensors of a provider
pub fn build_adp_matrix_from<P>(atoms: &P) -> MeasureResult<AdpMatrix>
where
    P: AnisouProvider + ?Sized,
{
    let records = atoms.aniso_temp_factors().ok_or(MeasureError::MissingData(ANISOU))?;
    Ok(build_adp_matrix(&records))
}

/// [`AdpAnalyzer::calc_adps`] with the default provider
pub fn calc_adps(record: &TensorRecord) -> Adp {
    AdpAnalyzer::new().calc_adps(record)
}

/// [`AdpAnalyzer::calc_adp_axes`] with the default provider
pub fn calc_adp_axes(records: &[TensorRecord], filter: AnisotropyFilter) -> MeasureResult<AdpAxes> {
    AdpAnalyzer::new().calc_adp_axes(records, filter)
}

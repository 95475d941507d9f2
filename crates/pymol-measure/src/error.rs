//! Error types for measurement and alignment operations
//!
//! Shape errors describe a malformed call (mismatched point counts, wrong
//! weight lengths, ragged stacks). Missing-data errors describe an input that
//! cannot be measured at all. Numerically degenerate input is never an error.

use thiserror::Error;

/// Errors that can occur when aligning or measuring coordinates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasureError {
    /// Two paired coordinate arrays have different point counts
    #[error("Coordinate arrays have different lengths: {0} vs {1}")]
    LengthMismatch(usize, usize),

    /// Weight vector length does not match the point count
    #[error("Weights must have one value per atom: expected {expected}, got {actual}")]
    WeightLength { expected: usize, actual: usize },

    /// Frame count of a paired stack does not match
    #[error("Frame count mismatch: expected {expected}, got {actual}")]
    FrameCount { expected: usize, actual: usize },

    /// Array with the wrong number of elements for its declared shape
    #[error("Invalid shape for {what}: {detail}")]
    InvalidShape { what: &'static str, detail: String },

    /// Coordinate set with no points
    #[error("Coordinate set is empty")]
    EmptyCoordinates,

    /// Atom or frame index outside the valid range
    #[error("Index {index} is out of bounds (len: {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Requested data is not present on the input
    #[error("{0} are not set")]
    MissingData(&'static str),

    /// Parameter outside its accepted range
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl MeasureError {
    /// Create an invalid shape error
    pub fn invalid_shape(what: &'static str, detail: impl Into<String>) -> Self {
        MeasureError::InvalidShape {
            what,
            detail: detail.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        MeasureError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True for errors caused by malformed array shapes
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            MeasureError::LengthMismatch(..)
                | MeasureError::WeightLength { .. }
                | MeasureError::FrameCount { .. }
                | MeasureError::InvalidShape { .. }
                | MeasureError::EmptyCoordinates
                | MeasureError::IndexOutOfBounds { .. }
        )
    }
}

/// Result type for measurement operations
pub type MeasureResult<T> = Result<T, MeasureError>;

/// Check that a paired coordinate array has the expected point count
pub(crate) fn check_same_len(expected: usize, actual: usize) -> MeasureResult<()> {
    if expected != actual {
        return Err(MeasureError::LengthMismatch(expected, actual));
    }
    Ok(())
}

/// Check an optional per-atom weight vector against the point count
///
/// Weights must be finite, non-negative and must not all be zero.
pub(crate) fn check_weights(weights: Option<&[f64]>, n_atoms: usize) -> MeasureResult<()> {
    let Some(w) = weights else {
        return Ok(());
    };
    if w.len() != n_atoms {
        return Err(MeasureError::WeightLength {
            expected: n_atoms,
            actual: w.len(),
        });
    }
    if let Some(bad) = w.iter().find(|x| !x.is_finite() || **x < 0.0) {
        return Err(MeasureError::invalid_parameter(
            "weights",
            format!("weights must be finite and non-negative, found {}", bad),
        ));
    }
    if n_atoms > 0 && w.iter().sum::<f64>() <= 0.0 {
        return Err(MeasureError::invalid_parameter("weights", "weights sum to zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_classification() {
        assert!(MeasureError::LengthMismatch(3, 4).is_shape_error());
        assert!(MeasureError::EmptyCoordinates.is_shape_error());
        assert!(!MeasureError::MissingData("anisotropic temperature factors").is_shape_error());
        assert!(!MeasureError::invalid_parameter("fract", "out of range").is_shape_error());
    }

    #[test]
    fn test_weight_check() {
        assert!(check_weights(None, 5).is_ok());
        assert!(check_weights(Some(&[1.0; 5]), 5).is_ok());
        assert_eq!(
            check_weights(Some(&[1.0; 4]), 5),
            Err(MeasureError::WeightLength { expected: 5, actual: 4 })
        );
    }

    #[test]
    fn test_weight_values() {
        assert!(check_weights(Some(&[1.0, -1.0]), 2).is_err());
        assert!(check_weights(Some(&[0.0, 0.0]), 2).is_err());
        assert!(check_weights(Some(&[f64::NAN, 1.0]), 2).is_err());
        assert!(check_weights(Some(&[0.0, 2.0]), 2).is_ok());
    }

    #[test]
    fn test_missing_data_message() {
        let err = MeasureError::MissingData("anisotropic temperature factors");
        assert_eq!(err.to_string(), "anisotropic temperature factors are not set");
    }
}

//! Structural superposition and geometric measurements for PyMOL-RS
//!
//! This crate provides the numeric core behind structure comparison:
//! - Weighted Kabsch superposition of one pair or of whole coordinate stacks
//! - RMSD, radius of gyration and point-wise distances
//! - Principal axes of anisotropic displacement parameters (ADPs)
//!
//! Coordinates are plain `[f64; 3]` arrays. Structure types take part through
//! [`CoordinateProvider`] and [`AnisouProvider`].
//!
//! # Example
//!
//! ```
//! use pymol_measure::{calc_rmsd, superpose};
//!
//! let mobile = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
//! let target = [[5.0, 0.0, 0.0], [5.0, 1.0, 0.0], [4.0, 0.0, 0.0]];
//! let (moved, _t) = superpose(&mobile, &target, None).unwrap();
//! assert!(calc_rmsd(&moved, &target, None).unwrap() < 1e-9);
//! ```

pub mod adp;
pub mod align;
pub mod config;
pub mod coords;
pub mod distance;
pub mod error;
pub mod gyration;
pub mod linalg;
pub mod rmsd;

pub use adp::{
    build_adp_matrix, build_adp_matrix_from, calc_adp_axes, calc_adps, Adp, AdpAnalyzer, AdpAxes, AdpMatrix,
    AnisotropyFilter, RatioAxis,
};
pub use align::{calc_transformation, superpose, superpose_stack, Aligner, Transformation};
pub use config::ExecutionPolicy;
pub use coords::{centroid, AnisouProvider, Coord, CoordStack, CoordinateProvider, Coordinates, TensorRecord};
pub use distance::{calc_deform_vector, calc_distance, calc_distance_stack};
pub use error::{MeasureError, MeasureResult};
pub use gyration::{calc_radius_of_gyration, calc_radius_of_gyration_stack, calc_radius_of_gyration_stack_with};
pub use linalg::{Jacobi, LinearAlgebra, Nalgebra};
pub use rmsd::{calc_rmsd, calc_rmsd_stack, calc_rmsd_stack_with, StackWeights};

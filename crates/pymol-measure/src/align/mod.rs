//! Rigid-body superposition
//!
//! - Kabsch solver for one mobile/target pair
//! - Batch superposition of coordinate stacks against a fixed target
//! - Ensemble alignment onto one of its own frames

mod batch;
pub mod kabsch;
mod transform;

pub use batch::superpose_stack;
pub use kabsch::{calc_transformation, superpose, Aligner};
pub use transform::Transformation;

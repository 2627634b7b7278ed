//! Core data structures for treevol
//!
//! This crate provides the double-precision vertex types, the decoded polygon
//! mesh and the volume/area estimator that turns a closed mesh into a
//! tree volume.

pub mod point;
pub mod mesh;
pub mod measure;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use measure::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

/// Common result type for treevol operations
pub type Result<T> = std::result::Result<T, Error>;

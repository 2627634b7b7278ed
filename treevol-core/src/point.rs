//! Point types

use nalgebra::{Point3, Vector3};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// A mesh vertex. Coordinates are widened to `f64` on decode so that the
/// per-triangle volume sum does not accumulate single precision error.
pub type Vertex = Point3d;

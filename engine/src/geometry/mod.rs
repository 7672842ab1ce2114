//! Value types shared by the collision tree and the model layer, generic over float precision.

pub mod bounding_box;
pub mod line;
pub mod matrix;
pub mod plane;
pub mod polygon;
pub mod quaternion;
pub mod ray;
pub mod sphere;
pub mod vector;

pub use bounding_box::{Axis, BoundingBox};
pub use line::Line;
pub use matrix::Matrix16;
pub use plane::Plane;
pub use polygon::Polygon;
pub use quaternion::Quaternion;
pub use ray::Ray;
pub use sphere::Sphere;
pub use vector::{Point, Size, Vector2, Vector3};

use num_traits::Float;

/// Converts an `f64` literal to the working precision.
#[inline]
pub(crate) fn lit<T: Float>(v: f64) -> T {
    T::from(v).unwrap_or_else(T::nan)
}

/// Tolerance used by containment and parallelism tests.
#[inline]
pub(crate) fn epsilon<T: Float>() -> T {
    lit(1.0e-5)
}

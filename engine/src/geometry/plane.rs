use num_traits::Float;

use super::{Ray, Vector3};

/// Plane `a*x + b*y + c*z + d = 0`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Plane<T> {
    pub a: T,
    pub b: T,
    pub c: T,
    pub d: T,
}

impl<T: Float> Plane<T> {
    pub fn new(a: T, b: T, c: T, d: T) -> Self {
        Self { a, b, c, d }
    }

    pub fn from_point_normal(point: &Vector3<T>, normal: &Vector3<T>) -> Self {
        Self::new(normal.x, normal.y, normal.z, -normal.dot(point))
    }

    /// Plane through three points, `None` when they are colinear.
    pub fn from_points(v1: &Vector3<T>, v2: &Vector3<T>, v3: &Vector3<T>) -> Option<Self> {
        let normal = (*v2 - *v1).cross(&(*v3 - *v1)).normalize();

        if normal == Vector3::zero() {
            return None;
        }

        Some(Self::from_point_normal(v1, &normal))
    }

    pub fn normal(&self) -> Vector3<T> {
        Vector3::new(self.a, self.b, self.c)
    }

    /// Signed distance, positive on the side the normal points to.
    pub fn distance_to(&self, point: &Vector3<T>) -> T {
        self.normal().dot(point) + self.d
    }

    /// Point where the forward half of `ray` crosses the plane.
    pub fn intersect_ray(&self, ray: &Ray<T>) -> Option<Vector3<T>> {
        let normal = self.normal();
        let dot = normal.dot(&ray.dir());

        if dot == T::zero() {
            return None;
        }

        let t = -(normal.dot(&ray.pos()) + self.d) / dot;

        if t < T::zero() {
            return None;
        }

        Some(ray.at(t))
    }
}

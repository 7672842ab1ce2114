use num_traits::Float;

use super::{lit, Plane, Ray, Vector3};

/// Triangle.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Polygon<T> {
    pub vertices: [Vector3<T>; 3],
}

impl<T: Float> Polygon<T> {
    pub fn new(v1: Vector3<T>, v2: Vector3<T>, v3: Vector3<T>) -> Self {
        Self {
            vertices: [v1, v2, v3],
        }
    }

    pub fn vertex(&self, index: usize) -> Vector3<T> {
        self.vertices[index]
    }

    pub fn center(&self) -> Vector3<T> {
        (self.vertices[0] + self.vertices[1] + self.vertices[2]) / lit::<T>(3.0)
    }

    pub fn plane(&self) -> Option<Plane<T>> {
        Plane::from_points(&self.vertices[0], &self.vertices[1], &self.vertices[2])
    }

    /// True when `point`, assumed to lie on the polygon plane, is inside the triangle.
    ///
    /// Sums the angles seen from the point between each pair of vertices,
    /// which only reaches a full turn for inner points.
    pub fn contains_point(&self, point: &Vector3<T>) -> bool {
        let to = |i: usize| (self.vertices[i] - *point).normalize();
        let (a, b, c) = (to(0), to(1), to(2));

        let angle = |u: &Vector3<T>, v: &Vector3<T>| u.dot(v).max(-T::one()).min(T::one()).acos();
        let sum = angle(&a, &b) + angle(&b, &c) + angle(&c, &a);

        sum >= lit::<T>(std::f64::consts::TAU) * lit(0.999)
    }

    pub fn intersect_ray(&self, ray: &Ray<T>) -> Option<Vector3<T>> {
        let hit = self.plane()?.intersect_ray(ray)?;

        self.contains_point(&hit).then_some(hit)
    }

    pub fn intersects_ray(&self, ray: &Ray<T>) -> bool {
        self.intersect_ray(ray).is_some()
    }
}

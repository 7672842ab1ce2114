use num_traits::Float;

use super::{BoundingBox, Vector3};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Sphere<T> {
    pub center: Vector3<T>,
    pub radius: T,
}

impl<T: Float> Sphere<T> {
    pub fn new(center: Vector3<T>, radius: T) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, point: &Vector3<T>) -> bool {
        self.center.distance(point) <= self.radius
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.center.distance(&other.center) <= self.radius + other.radius
    }

    pub fn intersects_box(&self, b: &BoundingBox<T>) -> bool {
        let closest = self.center.max(&b.min).min(&b.max);

        self.contains(&closest)
    }
}

#[cfg(test)]
mod sphere_tests {
    use super::*;

    #[test]
    fn test_sphere() {
        let a = Sphere::new(Vector3::zero(), 1.0f32);
        let b = Sphere::new(Vector3::new(1.5, 0.0, 0.0), 0.5);
        let c = Sphere::new(Vector3::new(3.0, 0.0, 0.0), 0.5);

        assert!(a.contains(&Vector3::new(0.0, 1.0, 0.0)));
        assert!(!a.contains(&Vector3::new(0.0, 1.1, 0.0)));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));

        let bounds = BoundingBox::new(Vector3::new(0.5, -1.0, -1.0), Vector3::splat(2.0));
        assert!(a.intersects_box(&bounds));
        assert!(!c.intersects_box(&BoundingBox::new(Vector3::zero(), Vector3::splat(1.0))));
    }
}

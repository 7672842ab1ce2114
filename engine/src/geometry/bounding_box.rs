use num_traits::Float;

use super::{lit, Plane, Ray, Vector3};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn component<T: Copy>(self, v: &Vector3<T>) -> T {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    pub fn unit<T: Float>(self) -> Vector3<T> {
        let (o, z) = (T::one(), T::zero());

        match self {
            Axis::X => Vector3::new(o, z, z),
            Axis::Y => Vector3::new(z, o, z),
            Axis::Z => Vector3::new(z, z, o),
        }
    }
}

/// Axis aligned box.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BoundingBox<T> {
    pub min: Vector3<T>,
    pub max: Vector3<T>,
}

impl<T: Float> BoundingBox<T> {
    pub fn new(min: Vector3<T>, max: Vector3<T>) -> Self {
        Self { min, max }
    }

    /// Smallest box holding every point, `None` if there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vector3<T>>) -> Option<Self>
    where
        T: 'a,
    {
        let mut points = points.into_iter();
        let first = *points.next()?;

        let mut bounds = Self::new(first, first);
        for p in points {
            bounds.extend(p);
        }

        Some(bounds)
    }

    pub fn extend(&mut self, point: &Vector3<T>) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn center(&self) -> Vector3<T> {
        (self.min + self.max) / lit::<T>(2.0)
    }

    pub fn size(&self) -> Vector3<T> {
        self.max - self.min
    }

    /// Longest side, preferring x then y on ties.
    pub fn longest_axis(&self) -> Axis {
        let s = self.size();

        if s.x >= s.y && s.x >= s.z {
            Axis::X
        } else if s.y >= s.x && s.y >= s.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Plane through the box center, perpendicular to `axis`.
    pub fn splitting_plane(&self, axis: Axis) -> Plane<T> {
        Plane::from_point_normal(&self.center(), &axis.unit())
    }

    /// Halves the box across its longest axis.
    pub fn cut(&self) -> (Self, Self) {
        let axis = self.longest_axis();
        let half = axis.component(&self.size()) / lit(2.0);

        let mut left = *self;
        let mut right = *self;

        match axis {
            Axis::X => {
                left.max.x = self.min.x + half;
                right.min.x = left.max.x;
            }
            Axis::Y => {
                left.max.y = self.min.y + half;
                right.min.y = left.max.y;
            }
            Axis::Z => {
                left.max.z = self.min.z + half;
                right.min.z = left.max.z;
            }
        }

        (left, right)
    }

    /// Inclusive containment with a tolerance on every side.
    pub fn contains(&self, point: &Vector3<T>, epsilon: T) -> bool {
        let between = |v: T, a: T, b: T| v >= a.min(b) - epsilon && v <= a.max(b) + epsilon;

        between(point.x, self.min.x, self.max.x)
            && between(point.y, self.min.y, self.max.y)
            && between(point.z, self.min.z, self.max.z)
    }

    pub fn intersects(&self, other: &Self) -> bool {
        !(self.min.x > other.max.x
            || self.max.x < other.min.x
            || self.min.y > other.max.y
            || self.max.y < other.min.y
            || self.min.z > other.max.z
            || self.max.z < other.min.z)
    }

    /// Slab test against the forward half of `ray`.
    pub fn intersects_ray(&self, ray: &Ray<T>) -> bool {
        let pos = ray.pos();
        let dir = ray.dir();
        let inv = ray.inv_dir();

        let mut t_min = T::neg_infinity();
        let mut t_max = T::infinity();

        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let p = axis.component(&pos);
            let lo = axis.component(&self.min);
            let hi = axis.component(&self.max);

            // parallel to this slab: only hits if already inside it
            if axis.component(&dir) == T::zero() {
                if p < lo || p > hi {
                    return false;
                }
                continue;
            }

            let i = axis.component(&inv);
            let t1 = (lo - p) * i;
            let t2 = (hi - p) * i;

            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }

        t_max >= t_min && t_max >= T::zero()
    }
}

use std::ops::{Add, Mul, Neg, Sub};

use num_traits::Float;

use super::{lit, Matrix16, Vector3};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Quaternion<T> {
    pub x: T,
    pub y: T,
    pub z: T,
    pub w: T,
}

impl<T: Float> Default for Quaternion<T> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<T: Float> Quaternion<T> {
    pub fn new(x: T, y: T, z: T, w: T) -> Self {
        Self { x, y, z, w }
    }

    pub fn identity() -> Self {
        Self::new(T::zero(), T::zero(), T::zero(), T::one())
    }

    /// Rotation of `angle` radians around the unit vector `axis`.
    pub fn from_axis_angle(axis: &Vector3<T>, angle: T) -> Self {
        let half = angle / lit(2.0);
        let s = half.sin();

        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    /// Extracts the rotation of a row-vector matrix.
    pub fn from_matrix(m: &Matrix16<T>) -> Self {
        let t = &m.table;
        let (one, quarter, two) = (T::one(), lit::<T>(0.25), lit::<T>(2.0));

        let diagonal = t[0][0] + t[1][1] + t[2][2] + t[3][3];

        if diagonal > lit(0.00000001) {
            let scale = diagonal.sqrt() * two;

            return Self::new(
                (t[1][2] - t[2][1]) / scale,
                (t[2][0] - t[0][2]) / scale,
                (t[0][1] - t[1][0]) / scale,
                quarter * scale,
            );
        }

        if t[0][0] > t[1][1] && t[0][0] > t[2][2] {
            let scale = (one + t[0][0] - t[1][1] - t[2][2]).sqrt() * two;

            Self::new(
                quarter * scale,
                (t[0][1] + t[1][0]) / scale,
                (t[2][0] + t[0][2]) / scale,
                (t[1][2] - t[2][1]) / scale,
            )
        } else if t[1][1] > t[2][2] {
            let scale = (one + t[1][1] - t[0][0] - t[2][2]).sqrt() * two;

            Self::new(
                (t[0][1] + t[1][0]) / scale,
                quarter * scale,
                (t[1][2] + t[2][1]) / scale,
                (t[2][0] - t[0][2]) / scale,
            )
        } else {
            let scale = (one + t[2][2] - t[0][0] - t[1][1]).sqrt() * two;

            Self::new(
                (t[2][0] + t[0][2]) / scale,
                (t[1][2] + t[2][1]) / scale,
                quarter * scale,
                (t[0][1] - t[1][0]) / scale,
            )
        }
    }

    pub fn norm(&self) -> T {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    pub fn length(&self) -> T {
        self.norm().sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();

        if len == T::zero() {
            return *self;
        }

        self.scale(T::one() / len)
    }

    pub fn dot(&self, other: &Self) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn scale(&self, s: T) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }

    pub fn conjugate(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// `None` for a zero quaternion.
    pub fn inverse(&self) -> Option<Self> {
        let norm = self.norm();

        if norm == T::zero() {
            return None;
        }

        Some(self.conjugate().scale(T::one() / norm))
    }

    /// Spherical interpolation along the shortest arc, falling back to a plain
    /// blend when both orientations are close.
    pub fn slerp(&self, other: &Self, p: T) -> Self {
        if self == other {
            return *self;
        }

        let mut result = self.dot(other);
        let target = if result < T::zero() {
            result = -result;
            -*other
        } else {
            *other
        };

        let mut scale0 = T::one() - p;
        let mut scale1 = p;

        if T::one() - result > lit(0.1) {
            let theta = result.min(T::one()).acos();
            let sin_theta = theta.sin();

            if sin_theta != T::zero() {
                scale0 = ((T::one() - p) * theta).sin() / sin_theta;
                scale1 = (p * theta).sin() / sin_theta;
            }
        }

        self.scale(scale0) + target.scale(scale1)
    }

    pub fn rotate(&self, v: &Vector3<T>) -> Vector3<T> {
        let Some(inv) = self.inverse() else {
            return *v;
        };

        let qv = Self::new(v.x, v.y, v.z, T::zero());
        let r = *self * qv * inv;

        Vector3::new(r.x, r.y, r.z)
    }

    pub fn matrix(&self) -> Matrix16<T> {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        let (o, n, two) = (T::one(), T::zero(), lit::<T>(2.0));

        Matrix16::from_table([
            [
                o - two * (y * y + z * z),
                two * (x * y - w * z),
                two * (x * z + w * y),
                n,
            ],
            [
                two * (x * y + w * z),
                o - two * (x * x + z * z),
                two * (y * z - w * x),
                n,
            ],
            [
                two * (x * z - w * y),
                two * (y * z + w * x),
                o - two * (x * x + y * y),
                n,
            ],
            [n, n, n, o],
        ])
    }
}

impl<T: Float> Add for Quaternion<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.w + rhs.w)
    }
}

impl<T: Float> Sub for Quaternion<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z, self.w - rhs.w)
    }
}

impl<T: Float> Neg for Quaternion<T> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}

impl<T: Float> Mul for Quaternion<T> {
    type Output = Self;

    /// Hamilton product.
    fn mul(self, q: Self) -> Self {
        Self::new(
            self.w * q.x + self.x * q.w + self.y * q.z - self.z * q.y,
            self.w * q.y - self.x * q.z + self.y * q.w + self.z * q.x,
            self.w * q.z + self.x * q.y - self.y * q.x + self.z * q.w,
            self.w * q.w - self.x * q.x - self.y * q.y - self.z * q.z,
        )
    }
}

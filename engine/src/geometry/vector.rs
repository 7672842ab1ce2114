use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::Float;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector2<T> {
    pub x: T,
    pub y: T,
}

pub type Point<T> = Vector2<T>;
pub type Size<T> = Vector2<T>;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

macro_rules! impl_vector_ops {
    ($name:ident { $($f:ident),+ }) => {
        impl<T: Float> Add for $name<T> {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self { $($f: self.$f + rhs.$f),+ }
            }
        }
        impl<T: Float> Sub for $name<T> {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self { $($f: self.$f - rhs.$f),+ }
            }
        }
        impl<T: Float> Neg for $name<T> {
            type Output = Self;
            fn neg(self) -> Self {
                Self { $($f: -self.$f),+ }
            }
        }
        impl<T: Float> Mul for $name<T> {
            type Output = Self;
            fn mul(self, rhs: Self) -> Self {
                Self { $($f: self.$f * rhs.$f),+ }
            }
        }
        impl<T: Float> Mul<T> for $name<T> {
            type Output = Self;
            fn mul(self, rhs: T) -> Self {
                Self { $($f: self.$f * rhs),+ }
            }
        }
        impl<T: Float> Div for $name<T> {
            type Output = Self;
            fn div(self, rhs: Self) -> Self {
                Self { $($f: self.$f / rhs.$f),+ }
            }
        }
        impl<T: Float> Div<T> for $name<T> {
            type Output = Self;
            fn div(self, rhs: T) -> Self {
                Self { $($f: self.$f / rhs),+ }
            }
        }
        impl<T: Float> AddAssign for $name<T> {
            fn add_assign(&mut self, rhs: Self) {
                $(self.$f = self.$f + rhs.$f;)+
            }
        }
        impl<T: Float> SubAssign for $name<T> {
            fn sub_assign(&mut self, rhs: Self) {
                $(self.$f = self.$f - rhs.$f;)+
            }
        }
        impl<T: Float> MulAssign<T> for $name<T> {
            fn mul_assign(&mut self, rhs: T) {
                $(self.$f = self.$f * rhs;)+
            }
        }
        impl<T: Float> DivAssign<T> for $name<T> {
            fn div_assign(&mut self, rhs: T) {
                $(self.$f = self.$f / rhs;)+
            }
        }
    };
}

impl_vector_ops!(Vector2 { x, y });
impl_vector_ops!(Vector3 { x, y, z });

impl<T: Float> Vector2<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::new(T::zero(), T::zero())
    }

    pub fn dot(&self, other: &Self) -> T {
        self.x * other.x + self.y * other.y
    }

    pub fn length(&self) -> T {
        self.dot(self).sqrt()
    }
}

impl<T: Float> Vector3<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::splat(T::zero())
    }

    pub fn splat(v: T) -> Self {
        Self::new(v, v, v)
    }

    pub fn from_array(a: [T; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    pub fn to_array(self) -> [T; 3] {
        [self.x, self.y, self.z]
    }

    pub fn dot(&self, other: &Self) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - other.y * self.z,
            self.z * other.x - other.z * self.x,
            self.x * other.y - other.x * self.y,
        )
    }

    pub fn length(&self) -> T {
        self.dot(self).sqrt()
    }

    pub fn distance(&self, other: &Self) -> T {
        (*self - *other).length()
    }

    /// Unit vector in the same direction, or zero for a zero length vector.
    pub fn normalize(&self) -> Self {
        let len = self.length();

        if len == T::zero() {
            return Self::zero();
        }

        *self / len
    }

    pub fn lerp(&self, other: &Self, t: T) -> Self {
        *self + (*other - *self) * t
    }

    pub fn min(&self, other: &Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    pub fn max(&self, other: &Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    pub fn abs_diff_eq(&self, other: &Self, epsilon: T) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
    }
}

impl From<Vector3<f32>> for glam::Vec3 {
    fn from(v: Vector3<f32>) -> Self {
        glam::Vec3::new(v.x, v.y, v.z)
    }
}

impl From<glam::Vec3> for Vector3<f32> {
    fn from(v: glam::Vec3) -> Self {
        Vector3::new(v.x, v.y, v.z)
    }
}

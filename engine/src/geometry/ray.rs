use num_traits::Float;

use super::Vector3;

/// Half line with a cached component-wise inverse direction for slab tests.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray<T> {
    pos: Vector3<T>,
    dir: Vector3<T>,
    inv_dir: Vector3<T>,
}

impl<T: Float> Ray<T> {
    pub fn new(pos: Vector3<T>, dir: Vector3<T>) -> Self {
        Self {
            pos,
            dir,
            inv_dir: Self::inverse(&dir),
        }
    }

    fn inverse(dir: &Vector3<T>) -> Vector3<T> {
        let inv = |c: T| {
            if c == T::zero() {
                T::infinity()
            } else {
                T::one() / c
            }
        };

        Vector3::new(inv(dir.x), inv(dir.y), inv(dir.z))
    }

    pub fn pos(&self) -> Vector3<T> {
        self.pos
    }

    pub fn set_pos(&mut self, pos: Vector3<T>) {
        self.pos = pos;
    }

    pub fn dir(&self) -> Vector3<T> {
        self.dir
    }

    pub fn set_dir(&mut self, dir: Vector3<T>) {
        self.dir = dir;
        self.inv_dir = Self::inverse(&dir);
    }

    pub fn inv_dir(&self) -> Vector3<T> {
        self.inv_dir
    }

    pub fn at(&self, t: T) -> Vector3<T> {
        self.pos + self.dir * t
    }
}

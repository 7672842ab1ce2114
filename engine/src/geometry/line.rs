use num_traits::Float;

use super::{epsilon, Vector3};

/// Segment between two points.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Line<T> {
    pub start: Vector3<T>,
    pub end: Vector3<T>,
}

impl<T: Float> Line<T> {
    pub fn new(start: Vector3<T>, end: Vector3<T>) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> T {
        self.start.distance(&self.end)
    }

    /// Point of the segment nearest to `point`.
    pub fn closest_point(&self, point: &Vector3<T>) -> Vector3<T> {
        let seg = self.end - self.start;
        let len_sq = seg.dot(&seg);

        if len_sq == T::zero() {
            return self.start;
        }

        let t = ((*point - self.start).dot(&seg) / len_sq)
            .max(T::zero())
            .min(T::one());

        self.start + seg * t
    }

    pub fn distance_to_point(&self, point: &Vector3<T>) -> T {
        self.closest_point(point).distance(point)
    }

    /// Shortest distance between two segments.
    pub fn distance_to_line(&self, other: &Line<T>) -> T {
        let zero = T::zero();
        let eps = epsilon::<T>();

        let u = self.end - self.start;
        let v = other.end - other.start;
        let w = self.start - other.start;

        let a = u.dot(&u);
        let b = u.dot(&v);
        let c = v.dot(&v);
        let d = u.dot(&w);
        let e = v.dot(&w);
        let det = a * c - b * b;

        let (mut s_n, mut s_d) = (zero, det);
        let mut t_d = det;
        let mut t_n;

        if det < eps {
            // almost parallel, pin the first parameter
            s_d = T::one();
            t_n = e;
            t_d = c;
        } else {
            s_n = b * e - c * d;
            t_n = a * e - b * d;

            if s_n < zero {
                s_n = zero;
                t_n = e;
                t_d = c;
            } else if s_n > s_d {
                s_n = s_d;
                t_n = e + b;
                t_d = c;
            }
        }

        if t_n < zero {
            t_n = zero;

            if -d < zero {
                s_n = zero;
            } else if -d > a {
                s_n = s_d;
            } else {
                s_n = -d;
                s_d = a;
            }
        } else if t_n > t_d {
            t_n = t_d;

            if -d + b < zero {
                s_n = zero;
            } else if -d + b > a {
                s_n = s_d;
            } else {
                s_n = -d + b;
                s_d = a;
            }
        }

        let sc = if s_n.abs() < eps { zero } else { s_n / s_d };
        let tc = if t_n.abs() < eps { zero } else { t_n / t_d };

        (w + u * sc - v * tc).length()
    }
}

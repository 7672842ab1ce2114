use std::ops::Mul;

use num_traits::Float;

use super::{lit, Vector3};

/// 4x4 matrix, row major, used with row vectors: translation lives in row 3.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix16<T> {
    pub table: [[T; 4]; 4],
}

impl<T: Float> Default for Matrix16<T> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<T: Float> Matrix16<T> {
    pub fn from_table(table: [[T; 4]; 4]) -> Self {
        Self { table }
    }

    pub fn identity() -> Self {
        let (o, z) = (T::one(), T::zero());

        Self::from_table([[o, z, z, z], [z, o, z, z], [z, z, o, z], [z, z, z, o]])
    }

    /// `self * other`, `self` applied first.
    pub fn multiply(&self, other: &Self) -> Self {
        let mut table = [[T::zero(); 4]; 4];

        for (i, row) in table.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).fold(T::zero(), |acc, k| {
                    acc + self.table[i][k] * other.table[k][j]
                });
            }
        }

        Self::from_table(table)
    }

    pub fn determinant(&self) -> T {
        let m = &self.table;

        let t = [
            m[2][2] * m[3][3] - m[2][3] * m[3][2],
            m[2][1] * m[3][3] - m[2][3] * m[3][1],
            m[2][1] * m[3][2] - m[2][2] * m[3][1],
            m[2][0] * m[3][3] - m[2][3] * m[3][0],
            m[2][0] * m[3][2] - m[2][2] * m[3][0],
            m[2][0] * m[3][1] - m[2][1] * m[3][0],
        ];

        m[0][0] * (m[1][1] * t[0] - m[1][2] * t[1] + m[1][3] * t[2])
            - m[0][1] * (m[1][0] * t[0] - m[1][2] * t[3] + m[1][3] * t[4])
            + m[0][2] * (m[1][0] * t[1] - m[1][1] * t[3] + m[1][3] * t[5])
            - m[0][3] * (m[1][0] * t[2] - m[1][1] * t[4] + m[1][2] * t[5])
    }

    /// Inverse by cofactors, `None` for a singular matrix.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();

        if det == T::zero() {
            return None;
        }

        let mut table = [[T::zero(); 4]; 4];

        for (i, row) in table.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                // adjugate is the transposed cofactor matrix
                let sign = if (i + j) % 2 == 0 { T::one() } else { -T::one() };
                *cell = sign * self.minor(j, i) / det;
            }
        }

        Some(Self::from_table(table))
    }

    fn minor(&self, row: usize, col: usize) -> T {
        let mut m = [[T::zero(); 3]; 3];

        for (mi, i) in (0..4).filter(|&i| i != row).enumerate() {
            for (mj, j) in (0..4).filter(|&j| j != col).enumerate() {
                m[mi][mj] = self.table[i][j];
            }
        }

        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    pub fn translate(&mut self, t: &Vector3<T>) -> &mut Self {
        for c in 0..4 {
            self.table[3][c] = self.table[3][c]
                + self.table[0][c] * t.x
                + self.table[1][c] * t.y
                + self.table[2][c] * t.z;
        }

        self
    }

    /// Rotates by `angle` radians around the unit vector `axis`.
    pub fn rotate(&mut self, angle: T, axis: &Vector3<T>) -> &mut Self {
        let c = angle.cos();
        let s = angle.sin();
        let ic = T::one() - c;
        let r = axis;

        let mut rotation = Self::identity();
        rotation.table[0][0] = ic * r.x * r.x + c;
        rotation.table[1][0] = ic * r.x * r.y - s * r.z;
        rotation.table[2][0] = ic * r.x * r.z + s * r.y;
        rotation.table[0][1] = ic * r.y * r.x + s * r.z;
        rotation.table[1][1] = ic * r.y * r.y + c;
        rotation.table[2][1] = ic * r.y * r.z - s * r.x;
        rotation.table[0][2] = ic * r.z * r.x - s * r.y;
        rotation.table[1][2] = ic * r.z * r.y + s * r.x;
        rotation.table[2][2] = ic * r.z * r.z + c;

        *self = rotation.multiply(self);
        self
    }

    pub fn scale(&mut self, s: &Vector3<T>) -> &mut Self {
        for c in 0..4 {
            self.table[0][c] = self.table[0][c] * s.x;
            self.table[1][c] = self.table[1][c] * s.y;
            self.table[2][c] = self.table[2][c] * s.z;
        }

        self
    }

    pub fn transpose(&self) -> Self {
        let mut table = self.table;

        for (i, row) in table.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = self.table[j][i];
            }
        }

        Self::from_table(table)
    }

    pub fn transform(&self, v: &Vector3<T>) -> Vector3<T> {
        let m = &self.table;

        Vector3::new(
            v.x * m[0][0] + v.y * m[1][0] + v.z * m[2][0] + m[3][0],
            v.x * m[0][1] + v.y * m[1][1] + v.z * m[2][1] + m[3][1],
            v.x * m[0][2] + v.y * m[1][2] + v.z * m[2][2] + m[3][2],
        )
    }

    /// Transforms a direction, ignoring translation.
    pub fn transform_normal(&self, n: &Vector3<T>) -> Vector3<T> {
        let m = &self.table;

        Vector3::new(
            n.x * m[0][0] + n.y * m[1][0] + n.z * m[2][0],
            n.x * m[0][1] + n.y * m[1][1] + n.z * m[2][1],
            n.x * m[0][2] + n.y * m[1][2] + n.z * m[2][2],
        )
    }

    pub fn ortho(left: T, right: T, bottom: T, top: T, z_near: T, z_far: T) -> Option<Self> {
        if left == right || bottom == top || z_near == z_far {
            return None;
        }

        let (z, o, two) = (T::zero(), T::one(), lit::<T>(2.0));

        Some(Self::from_table([
            [two / (right - left), z, z, z],
            [z, two / (top - bottom), z, z],
            [z, z, two / (z_near - z_far), z],
            [
                (right + left) / (left - right),
                (top + bottom) / (bottom - top),
                (z_far + z_near) / (z_near - z_far),
                o,
            ],
        ]))
    }

    pub fn frustum(left: T, right: T, bottom: T, top: T, z_near: T, z_far: T) -> Option<Self> {
        let z = T::zero();

        if z_near <= z || z_far <= z || left == right || bottom == top || z_near == z_far {
            return None;
        }

        let two = lit::<T>(2.0);
        let x2n = two * z_near;
        let x2nf = two * z_near * z_far;
        let mnf = z_near - z_far;

        Some(Self::from_table([
            [x2n / (right - left), z, z, z],
            [z, x2n / (top - bottom), z, z],
            [
                (right + left) / (right - left),
                (top + bottom) / (top - bottom),
                (z_far + z_near) / mnf,
                -T::one(),
            ],
            [z, z, x2nf / mnf, z],
        ]))
    }

    /// Perspective (or matching orthographic) projection from a vertical field of view in degrees.
    pub fn perspective(fov: T, aspect: T, z_near: T, z_far: T, ortho: bool) -> Option<Self> {
        let max_y = z_near * (fov * lit(std::f64::consts::PI) / lit(360.0)).tan();
        let max_x = max_y * aspect;

        if ortho {
            Self::ortho(-max_x, max_x, -max_y, max_y, z_near, z_far)
        } else {
            Self::frustum(-max_x, max_x, -max_y, max_y, z_near, z_far)
        }
    }

    pub fn look_at_lh(position: &Vector3<T>, target: &Vector3<T>, up: &Vector3<T>) -> Self {
        Self::look_at(position, target, up, -T::one())
    }

    pub fn look_at_rh(position: &Vector3<T>, target: &Vector3<T>, up: &Vector3<T>) -> Self {
        Self::look_at(position, target, up, T::one())
    }

    fn look_at(position: &Vector3<T>, target: &Vector3<T>, up: &Vector3<T>, sign: T) -> Self {
        let z_axis = (*target - *position).normalize();
        let x_axis = up.cross(&z_axis).normalize();
        let y_axis = z_axis.cross(&x_axis);
        let z = T::zero();

        Self::from_table([
            [x_axis.x, y_axis.x, z_axis.x, z],
            [x_axis.y, y_axis.y, z_axis.y, z],
            [x_axis.z, y_axis.z, z_axis.z, z],
            [
                sign * x_axis.dot(position),
                sign * y_axis.dot(position),
                sign * z_axis.dot(position),
                T::one(),
            ],
        ])
    }

    /// Converts a viewport ray into world space.
    pub fn unproject(
        projection: &Self,
        view: &Self,
        pos: &Vector3<T>,
        dir: &Vector3<T>,
    ) -> Option<(Vector3<T>, Vector3<T>)> {
        let inv_projection = projection.inverse()?;
        let inv_view = view.inverse()?;

        let pos = inv_view.transform(&inv_projection.transform(pos));
        let dir = inv_view
            .transform_normal(&inv_projection.transform(dir))
            .normalize();

        Some((pos, dir))
    }

    pub fn abs_diff_eq(&self, other: &Self, epsilon: T) -> bool {
        self.table
            .iter()
            .flatten()
            .zip(other.table.iter().flatten())
            .all(|(a, b)| (*a - *b).abs() <= epsilon)
    }
}

impl<T: Float> Mul for Matrix16<T> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.multiply(&rhs)
    }
}

impl From<Matrix16<f32>> for glam::Mat4 {
    /// Rows of a row-vector matrix are the columns of the column-vector equivalent.
    fn from(m: Matrix16<f32>) -> Self {
        glam::Mat4::from_cols_array_2d(&m.table)
    }
}

impl From<glam::Mat4> for Matrix16<f32> {
    fn from(m: glam::Mat4) -> Self {
        Matrix16::from_table(m.to_cols_array_2d())
    }
}

#[cfg(test)]
mod matrix_tests {
    use super::*;

    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_translate_transform() {
        let mut m = Matrix16::<f32>::identity();
        m.translate(&Vector3::new(1.0, 2.0, 3.0));

        assert_eq!(m.transform(&Vector3::zero()), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(m.transform_normal(&Vector3::new(0.0, 1.0, 0.0)), Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_rotate_z() {
        let mut m = Matrix16::<f32>::identity();
        m.rotate(FRAC_PI_2, &Vector3::new(0.0, 0.0, 1.0));

        let v = m.transform(&Vector3::new(1.0, 0.0, 0.0));
        assert!(v.abs_diff_eq(&Vector3::new(0.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn test_scale_then_translate_order() {
        let mut s = Matrix16::<f32>::identity();
        s.scale(&Vector3::splat(2.0));
        let mut t = Matrix16::<f32>::identity();
        t.translate(&Vector3::new(1.0, 0.0, 0.0));

        let v = Vector3::new(1.0, 1.0, 1.0);
        assert_eq!((s * t).transform(&v), Vector3::new(3.0, 2.0, 2.0));
        assert_eq!((t * s).transform(&v), Vector3::new(4.0, 2.0, 2.0));
    }

    #[test]
    fn test_inverse() {
        let mut m = Matrix16::<f64>::identity();
        m.scale(&Vector3::new(2.0, 3.0, 4.0));
        m.rotate(0.7, &Vector3::new(0.0, 1.0, 0.0));
        m.translate(&Vector3::new(5.0, -1.0, 2.0));

        assert!((m.determinant() - 24.0).abs() < 1e-9);

        let inv = m.inverse().unwrap();
        assert!(m.multiply(&inv).abs_diff_eq(&Matrix16::identity(), 1e-9));

        let singular = Matrix16::from_table([[0.0f64; 4]; 4]);
        assert!(singular.inverse().is_none());
    }

    #[test]
    fn test_transpose() {
        let mut m = Matrix16::<f32>::identity();
        m.table[3][0] = 5.0;

        assert_eq!(m.transpose().table[0][3], 5.0);
        assert_eq!(m.transpose().transpose(), m);
    }

    #[test]
    fn test_projection_builders() {
        assert!(Matrix16::<f32>::ortho(0.0, 0.0, -1.0, 1.0, 1.0, 10.0).is_none());
        assert!(Matrix16::<f32>::frustum(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0).is_none());

        let p = Matrix16::<f32>::perspective(45.0, 1.5, 1.0, 100.0, false).unwrap();
        assert_eq!(p.table[2][3], -1.0);

        let o = Matrix16::<f32>::ortho(-2.0, 2.0, -1.0, 1.0, 0.0, 10.0).unwrap();
        assert_eq!(o.transform(&Vector3::new(2.0, 1.0, 0.0)).x, 1.0);
    }

    #[test]
    fn test_look_at() {
        let view = Matrix16::<f32>::look_at_rh(
            &Vector3::zero(),
            &Vector3::new(0.0, 0.0, 1.0),
            &Vector3::new(0.0, 1.0, 0.0),
        );

        assert!(view.abs_diff_eq(&Matrix16::identity(), 1e-6));
    }

    #[test]
    fn test_glam_roundtrip() {
        let mut m = Matrix16::<f32>::identity();
        m.translate(&Vector3::new(1.0, 2.0, 3.0));

        let g: glam::Mat4 = m.into();
        assert_eq!(g.w_axis, glam::Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(g.transform_point3(glam::Vec3::ZERO), glam::Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Matrix16::from(g), m);
    }
}

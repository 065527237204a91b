//! Mathematical types shared by the registry, the driver and host engines.
//!
//! Conventions:
//! - Right-handed world space, +Y up, cameras look down their local -Z.
//! - Matrices are column-major (`cols[column][row]`), matching WGPU/OpenGL.
//! - Clip space follows OpenGL: NDC x, y and z all span [-1, 1].

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 3D Vector - position, delta, direction
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit X vector
    pub const X: Self = Self::new(1.0, 0.0, 0.0);

    /// Unit Y vector
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Unit Z vector
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Extends to a homogeneous vector with the given `w`.
    #[must_use]
    pub const fn extend(self, w: f32) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, w)
    }

    /// True when every component is exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    /// True when no component is NaN or infinite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product (right-handed)
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero-length input.
    #[must_use]
    pub fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self * (1.0 / len)
        } else {
            Self::ZERO
        }
    }

    /// Distance to another point
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Distance squared (avoids sqrt)
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// 4D homogeneous vector - clip space, view space
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec4 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Vec4 {
    /// Creates a new Vec4
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Drops the `w` component.
    #[must_use]
    pub const fn truncate(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Divides `xyz` by `w`, or returns `None` when `w` is zero or not finite.
    #[must_use]
    pub fn perspective_divide(self) -> Option<Vec3> {
        if self.w == 0.0 || !self.w.is_finite() {
            return None;
        }
        let inv_w = 1.0 / self.w;
        Some(Vec3::new(self.x * inv_w, self.y * inv_w, self.z * inv_w))
    }

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

/// 2D Vector - screen positions, viewport offsets
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Creates a new Vec2
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl std::ops::Mul for Vec2 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y)
    }
}

/// Quaternion for rotations
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quaternion {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quaternion {
    /// Creates a new quaternion
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Rotation of `angle` radians around +X.
    #[must_use]
    pub fn from_rotation_x(angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(s, 0.0, 0.0, c)
    }

    /// Rotation of `angle` radians around +Y.
    #[must_use]
    pub fn from_rotation_y(angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self::new(0.0, s, 0.0, c)
    }

    /// Yaw around +Y applied after pitch around +X.
    #[must_use]
    pub fn from_yaw_pitch(yaw: f32, pitch: f32) -> Self {
        Self::from_rotation_y(yaw) * Self::from_rotation_x(pitch)
    }

    /// Rotates a vector.
    #[must_use]
    pub fn mul_vec3(self, v: Vec3) -> Vec3 {
        // v' = v + 2w(q x v) + 2(q x (q x v))
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Transform - position + rotation + scale
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Transform {
    /// Position
    pub position: Vec3,
    /// Scale (uniform)
    pub scale: f32,
    /// Rotation
    pub rotation: Quaternion,
}

impl Transform {
    /// Creates a new transform
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quaternion, scale: f32) -> Self {
        Self { position, scale, rotation }
    }

    /// Unrotated, unit-scale transform at `position`.
    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self::new(position, Quaternion::IDENTITY, 1.0)
    }

    /// Identity transform
    pub const IDENTITY: Self = Self::new(Vec3::ZERO, Quaternion::IDENTITY, 1.0);

    /// Local -Z rotated into world space.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation.mul_vec3(-Vec3::Z)
    }
}

/// 4x4 matrix, column-major.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Mat4 {
    /// Columns; `cols[c][r]` is row `r` of column `c`.
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    /// Identity matrix
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a matrix from four columns.
    #[must_use]
    pub const fn from_cols(cols: [[f32; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Returns the element at `row`, `col`.
    #[inline]
    #[must_use]
    pub const fn at(&self, row: usize, col: usize) -> f32 {
        self.cols[col][row]
    }

    /// True when no element is NaN or infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Transforms a homogeneous vector.
    #[inline]
    #[must_use]
    pub fn mul_vec4(&self, v: Vec4) -> Vec4 {
        let c = &self.cols;
        Vec4::new(
            c[0][0] * v.x + c[1][0] * v.y + c[2][0] * v.z + c[3][0] * v.w,
            c[0][1] * v.x + c[1][1] * v.y + c[2][1] * v.z + c[3][1] * v.w,
            c[0][2] * v.x + c[1][2] * v.y + c[2][2] * v.z + c[3][2] * v.w,
            c[0][3] * v.x + c[1][3] * v.y + c[2][3] * v.z + c[3][3] * v.w,
        )
    }

    /// Matrix product `self * rhs` (applies `rhs` first).
    #[must_use]
    pub fn mul_mat4(&self, rhs: &Self) -> Self {
        let mut cols = [[0.0; 4]; 4];
        for (out, col) in cols.iter_mut().zip(rhs.cols.iter()) {
            *out = self.mul_vec4(Vec4::new(col[0], col[1], col[2], col[3])).to_array();
        }
        Self { cols }
    }

    /// Inverse via Gauss-Jordan elimination with partial pivoting.
    ///
    /// Returns `None` for singular (or numerically singular) matrices.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        // Row-major working copies: a = self, inv = identity.
        let mut a = [[0.0f32; 4]; 4];
        let mut inv = [[0.0f32; 4]; 4];
        for r in 0..4 {
            for c in 0..4 {
                a[r][c] = self.cols[c][r];
            }
            inv[r][r] = 1.0;
        }

        for col in 0..4 {
            let mut pivot_row = col;
            for r in (col + 1)..4 {
                if a[r][col].abs() > a[pivot_row][col].abs() {
                    pivot_row = r;
                }
            }
            let pivot = a[pivot_row][col];
            if pivot.abs() < 1e-12 || !pivot.is_finite() {
                return None;
            }
            a.swap(col, pivot_row);
            inv.swap(col, pivot_row);

            let inv_pivot = 1.0 / pivot;
            for c in 0..4 {
                a[col][c] *= inv_pivot;
                inv[col][c] *= inv_pivot;
            }

            for r in 0..4 {
                if r == col {
                    continue;
                }
                let factor = a[r][col];
                if factor == 0.0 {
                    continue;
                }
                for c in 0..4 {
                    a[r][c] -= factor * a[col][c];
                    inv[r][c] -= factor * inv[col][c];
                }
            }
        }

        let mut cols = [[0.0; 4]; 4];
        for (c, col) in cols.iter_mut().enumerate() {
            for (r, value) in col.iter_mut().enumerate() {
                *value = inv[r][c];
            }
        }
        Some(Self { cols })
    }

    /// Right-handed orthographic projection, OpenGL depth range.
    #[must_use]
    pub fn orthographic_rh_gl(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let rl = 1.0 / (right - left);
        let tb = 1.0 / (top - bottom);
        let fne = 1.0 / (far - near);
        Self::from_cols([
            [2.0 * rl, 0.0, 0.0, 0.0],
            [0.0, 2.0 * tb, 0.0, 0.0],
            [0.0, 0.0, -2.0 * fne, 0.0],
            [-(right + left) * rl, -(top + bottom) * tb, -(far + near) * fne, 1.0],
        ])
    }

    /// Right-handed perspective projection, OpenGL depth range.
    ///
    /// `fov_y` is the full vertical field of view in radians.
    #[must_use]
    pub fn perspective_rh_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y * 0.5).tan();
        let nf = 1.0 / (near - far);
        Self::from_cols([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, (far + near) * nf, -1.0],
            [0.0, 0.0, 2.0 * far * near * nf, 0.0],
        ])
    }

    /// Right-handed view matrix for an eye at `eye` looking along `dir`.
    #[must_use]
    pub fn look_to_rh(eye: Vec3, dir: Vec3, up: Vec3) -> Self {
        let f = dir.normalize_or_zero();
        let s = f.cross(up).normalize_or_zero();
        let u = s.cross(f);
        Self::from_cols([
            [s.x, u.x, -f.x, 0.0],
            [s.y, u.y, -f.y, 0.0],
            [s.z, u.z, -f.z, 0.0],
            [-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0],
        ])
    }

    /// Pure translation.
    #[must_use]
    pub const fn from_translation(t: Vec3) -> Self {
        Self::from_cols([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [t.x, t.y, t.z, 1.0],
        ])
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_mat(a: &Mat4, b: &Mat4, eps: f32) -> bool {
        a.cols
            .iter()
            .flatten()
            .zip(b.cols.iter().flatten())
            .all(|(x, y)| (x - y).abs() < eps)
    }

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        let sum = a + b;
        assert_eq!(sum, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.dot(b), 32.0);
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
    }

    #[test]
    fn test_vec3_bytemuck() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 12);
        assert_eq!(std::mem::size_of::<Mat4>(), 64);
    }

    #[test]
    fn test_perspective_divide_rejects_zero_w() {
        assert!(Vec4::new(1.0, 1.0, 1.0, 0.0).perspective_divide().is_none());
        assert_eq!(
            Vec4::new(2.0, 4.0, 6.0, 2.0).perspective_divide(),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn test_quaternion_yaw_turns_forward() {
        let t = Transform::new(Vec3::ZERO, Quaternion::from_rotation_y(std::f32::consts::FRAC_PI_2), 1.0);
        let fwd = t.forward();
        // -Z yawed 90 degrees counter-clockwise (seen from above) is -X
        assert!((fwd.x + 1.0).abs() < 1e-6);
        assert!(fwd.z.abs() < 1e-6);
    }

    #[test]
    fn test_inverse_of_translation() {
        let m = Mat4::from_translation(Vec3::new(3.0, -2.0, 5.0));
        let inv = m.inverse().unwrap();
        assert!(approx_mat(&inv, &Mat4::from_translation(Vec3::new(-3.0, 2.0, -5.0)), 1e-6));
    }

    #[test]
    fn test_inverse_of_projection_round_trips() {
        let proj = Mat4::perspective_rh_gl(1.0, 16.0 / 9.0, 0.1, 100.0);
        let inv = proj.inverse().unwrap();
        assert!(approx_mat(&proj.mul_mat4(&inv), &Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        let m = Mat4::from_cols([[0.0; 4]; 4]);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_look_to_rh_maps_eye_to_origin() {
        let eye = Vec3::new(4.0, 10.0, -2.0);
        let view = Mat4::look_to_rh(eye, Vec3::new(0.0, -1.0, -1.0), Vec3::Y);
        let p = view.mul_vec4(eye.extend(1.0));
        assert!(p.truncate().length() < 1e-5);

        // A point straight ahead lands on the view-space -Z axis.
        let ahead = view.mul_vec4((eye + Vec3::new(0.0, -1.0, -1.0)).extend(1.0));
        assert!(ahead.x.abs() < 1e-5 && ahead.y.abs() < 1e-5);
        assert!(ahead.z < 0.0);
    }
}

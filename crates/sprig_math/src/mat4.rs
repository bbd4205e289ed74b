//! 4x4 Matrix utilities for 3D affine and projective transforms
//!
//! Matrices are column-major arrays (`m[column][row]`), the layout GPUs
//! expect for uniform uploads. Composition follows the usual convention:
//! `mul(a, b)` applies `b` first, then `a`.

use crate::{Quat, Vec3};

/// 4x4 matrix type (column-major)
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Translation matrix
pub fn from_translation(t: Vec3) -> Mat4 {
    let mut m = IDENTITY;
    m[3][0] = t.x;
    m[3][1] = t.y;
    m[3][2] = t.z;
    m
}

/// Non-uniform scale matrix
pub fn from_scale(s: Vec3) -> Mat4 {
    let mut m = IDENTITY;
    m[0][0] = s.x;
    m[1][1] = s.y;
    m[2][2] = s.z;
    m
}

/// Rotation matrix from a quaternion
#[inline]
pub fn from_rotation(q: Quat) -> Mat4 {
    q.to_matrix()
}

/// Translation * Rotation * Scale
pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    mul(mul(from_translation(translation), from_rotation(rotation)), from_scale(scale))
}

/// Multiply two 4x4 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut result = [[0.0f32; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Transform a point (w = 1) by an affine matrix
pub fn transform_point(m: Mat4, p: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * p.x + m[1][0] * p.y + m[2][0] * p.z + m[3][0],
        m[0][1] * p.x + m[1][1] * p.y + m[2][1] * p.z + m[3][1],
        m[0][2] * p.x + m[1][2] * p.y + m[2][2] * p.z + m[3][2],
    )
}

/// Transform a direction (w = 0); translation is ignored
pub fn transform_vector(m: Mat4, v: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * v.x + m[1][0] * v.y + m[2][0] * v.z,
        m[0][1] * v.x + m[1][1] * v.y + m[2][1] * v.z,
        m[0][2] * v.x + m[1][2] * v.y + m[2][2] * v.z,
    )
}

/// Translation component of an affine matrix
#[inline]
pub fn get_translation(m: Mat4) -> Vec3 {
    Vec3::new(m[3][0], m[3][1], m[3][2])
}

/// Largest axis scale of an affine matrix (length of the longest basis column)
pub fn max_scale(m: Mat4) -> f32 {
    let x = Vec3::new(m[0][0], m[0][1], m[0][2]).length();
    let y = Vec3::new(m[1][0], m[1][1], m[1][2]).length();
    let z = Vec3::new(m[2][0], m[2][1], m[2][2]).length();
    x.max(y).max(z)
}

/// Transpose a matrix
pub fn transpose(m: Mat4) -> Mat4 {
    [
        [m[0][0], m[1][0], m[2][0], m[3][0]],
        [m[0][1], m[1][1], m[2][1], m[3][1]],
        [m[0][2], m[1][2], m[2][2], m[3][2]],
        [m[0][3], m[1][3], m[2][3], m[3][3]],
    ]
}

/// General 4x4 inverse by cofactor expansion.
///
/// Returns `None` for singular matrices.
pub fn inverse(m: Mat4) -> Option<Mat4> {
    let a: [f32; 16] = [
        m[0][0], m[0][1], m[0][2], m[0][3],
        m[1][0], m[1][1], m[1][2], m[1][3],
        m[2][0], m[2][1], m[2][2], m[2][3],
        m[3][0], m[3][1], m[3][2], m[3][3],
    ];
    let mut inv = [0.0f32; 16];

    inv[0] = a[5] * a[10] * a[15] - a[5] * a[11] * a[14] - a[9] * a[6] * a[15]
        + a[9] * a[7] * a[14] + a[13] * a[6] * a[11] - a[13] * a[7] * a[10];
    inv[4] = -a[4] * a[10] * a[15] + a[4] * a[11] * a[14] + a[8] * a[6] * a[15]
        - a[8] * a[7] * a[14] - a[12] * a[6] * a[11] + a[12] * a[7] * a[10];
    inv[8] = a[4] * a[9] * a[15] - a[4] * a[11] * a[13] - a[8] * a[5] * a[15]
        + a[8] * a[7] * a[13] + a[12] * a[5] * a[11] - a[12] * a[7] * a[9];
    inv[12] = -a[4] * a[9] * a[14] + a[4] * a[10] * a[13] + a[8] * a[5] * a[14]
        - a[8] * a[6] * a[13] - a[12] * a[5] * a[10] + a[12] * a[6] * a[9];
    inv[1] = -a[1] * a[10] * a[15] + a[1] * a[11] * a[14] + a[9] * a[2] * a[15]
        - a[9] * a[3] * a[14] - a[13] * a[2] * a[11] + a[13] * a[3] * a[10];
    inv[5] = a[0] * a[10] * a[15] - a[0] * a[11] * a[14] - a[8] * a[2] * a[15]
        + a[8] * a[3] * a[14] + a[12] * a[2] * a[11] - a[12] * a[3] * a[10];
    inv[9] = -a[0] * a[9] * a[15] + a[0] * a[11] * a[13] + a[8] * a[1] * a[15]
        - a[8] * a[3] * a[13] - a[12] * a[1] * a[11] + a[12] * a[3] * a[9];
    inv[13] = a[0] * a[9] * a[14] - a[0] * a[10] * a[13] - a[8] * a[1] * a[14]
        + a[8] * a[2] * a[13] + a[12] * a[1] * a[10] - a[12] * a[2] * a[9];
    inv[2] = a[1] * a[6] * a[15] - a[1] * a[7] * a[14] - a[5] * a[2] * a[15]
        + a[5] * a[3] * a[14] + a[13] * a[2] * a[7] - a[13] * a[3] * a[6];
    inv[6] = -a[0] * a[6] * a[15] + a[0] * a[7] * a[14] + a[4] * a[2] * a[15]
        - a[4] * a[3] * a[14] - a[12] * a[2] * a[7] + a[12] * a[3] * a[6];
    inv[10] = a[0] * a[5] * a[15] - a[0] * a[7] * a[13] - a[4] * a[1] * a[15]
        + a[4] * a[3] * a[13] + a[12] * a[1] * a[7] - a[12] * a[3] * a[5];
    inv[14] = -a[0] * a[5] * a[14] + a[0] * a[6] * a[13] + a[4] * a[1] * a[14]
        - a[4] * a[2] * a[13] - a[12] * a[1] * a[6] + a[12] * a[2] * a[5];
    inv[3] = -a[1] * a[6] * a[11] + a[1] * a[7] * a[10] + a[5] * a[2] * a[11]
        - a[5] * a[3] * a[10] - a[9] * a[2] * a[7] + a[9] * a[3] * a[6];
    inv[7] = a[0] * a[6] * a[11] - a[0] * a[7] * a[10] - a[4] * a[2] * a[11]
        + a[4] * a[3] * a[10] + a[8] * a[2] * a[7] - a[8] * a[3] * a[6];
    inv[11] = -a[0] * a[5] * a[11] + a[0] * a[7] * a[9] + a[4] * a[1] * a[11]
        - a[4] * a[3] * a[9] - a[8] * a[1] * a[7] + a[8] * a[3] * a[5];
    inv[15] = a[0] * a[5] * a[10] - a[0] * a[6] * a[9] - a[4] * a[1] * a[10]
        + a[4] * a[2] * a[9] + a[8] * a[1] * a[6] - a[8] * a[2] * a[5];

    let det = a[0] * inv[0] + a[1] * inv[4] + a[2] * inv[8] + a[3] * inv[12];
    if det.abs() < f32::EPSILON * 1e-3 {
        return None;
    }
    let inv_det = 1.0 / det;

    let mut result = [[0.0f32; 4]; 4];
    for (i, value) in inv.iter().enumerate() {
        result[i / 4][i % 4] = value * inv_det;
    }
    Some(result)
}

/// Right-handed perspective projection with a [-1, 1] depth range
///
/// `fov_y` is the vertical field of view in radians.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y * 0.5).tan();
    let range = near - far;
    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, (far + near) / range, -1.0],
        [0.0, 0.0, 2.0 * far * near / range, 0.0],
    ]
}

/// Centered right-handed orthographic projection with a [-1, 1] depth range
pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Mat4 {
    let depth = far - near;
    [
        [2.0 / width, 0.0, 0.0, 0.0],
        [0.0, 2.0 / height, 0.0, 0.0],
        [0.0, 0.0, -2.0 / depth, 0.0],
        [0.0, 0.0, -(far + near) / depth, 1.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    fn mat_approx_eq(a: Mat4, b: Mat4) -> bool {
        for i in 0..4 {
            for j in 0..4 {
                if !approx_eq(a[i][j], b[i][j]) {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn test_identity() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(vec_approx_eq(transform_point(IDENTITY, p), p));
    }

    #[test]
    fn test_translation_moves_points_not_vectors() {
        let m = from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert!(vec_approx_eq(transform_point(m, Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0)));
        assert!(vec_approx_eq(transform_vector(m, Vec3::X), Vec3::X));
        assert!(vec_approx_eq(get_translation(m), Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_trs_order() {
        // X * 2 = (2,0,0), rotated 90 deg about Z = (0,2,0), + (10,0,0)
        let m = from_trs(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_2),
            Vec3::splat(2.0),
        );
        let result = transform_point(m, Vec3::X);
        assert!(vec_approx_eq(result, Vec3::new(10.0, 2.0, 0.0)), "got {:?}", result);
    }

    #[test]
    fn test_mul_identity() {
        let a = from_trs(Vec3::new(1.0, -2.0, 0.5), Quat::from_axis_angle(Vec3::Y, 0.3), Vec3::ONE);
        assert!(mat_approx_eq(mul(IDENTITY, a), a));
        assert!(mat_approx_eq(mul(a, IDENTITY), a));
    }

    #[test]
    fn test_inverse_round_trip() {
        let a = from_trs(
            Vec3::new(4.0, -1.0, 2.0),
            Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 0.8),
            Vec3::new(2.0, 1.0, 0.5),
        );
        let inv = inverse(a).unwrap();
        assert!(mat_approx_eq(mul(a, inv), IDENTITY));
        assert!(mat_approx_eq(mul(inv, a), IDENTITY));
    }

    #[test]
    fn test_singular_has_no_inverse() {
        assert!(inverse(from_scale(Vec3::new(1.0, 0.0, 1.0))).is_none());
    }

    #[test]
    fn test_transpose_twice() {
        let a = from_trs(Vec3::new(1.0, 2.0, 3.0), Quat::from_axis_angle(Vec3::X, 0.4), Vec3::ONE);
        assert_eq!(transpose(transpose(a)), a);
        assert_eq!(transpose(a)[0][3], a[3][0]);
    }

    #[test]
    fn test_max_scale() {
        let m = from_scale(Vec3::new(1.0, 3.0, 2.0));
        assert!(approx_eq(max_scale(m), 3.0));
    }

    #[test]
    fn test_perspective_maps_near_and_far() {
        let p = perspective(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 10.0);
        // Point on the near plane maps to ndc z = -1 after the w divide
        let near = [0.0, 0.0, -1.0, 1.0];
        let clip_z = p[2][2] * near[2] + p[3][2] * near[3];
        let clip_w = p[2][3] * near[2] + p[3][3] * near[3];
        assert!(approx_eq(clip_z / clip_w, -1.0));

        let far = [0.0, 0.0, -10.0, 1.0];
        let clip_z = p[2][2] * far[2] + p[3][2] * far[3];
        let clip_w = p[2][3] * far[2] + p[3][3] * far[3];
        assert!(approx_eq(clip_z / clip_w, 1.0));
    }

    #[test]
    fn test_orthographic_maps_extent() {
        let o = orthographic(4.0, 2.0, 0.0, 10.0);
        let p = transform_point(o, Vec3::new(2.0, 1.0, -10.0));
        assert!(vec_approx_eq(p, Vec3::new(1.0, 1.0, 1.0)), "got {:?}", p);
    }
}

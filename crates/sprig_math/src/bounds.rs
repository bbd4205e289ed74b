//! Axis-aligned bounding boxes and bounding spheres
//!
//! Both volumes treat a zero-sized value at the origin as "empty"; an empty
//! volume transforms to an empty volume and merging with it is a no-op.

use serde::{Serialize, Deserialize};
use crate::mat4::{self, Mat4};
use crate::Vec3;

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// The empty box
    pub const EMPTY: Self = Self { min: Vec3::ZERO, max: Vec3::ZERO };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box spanning `center ± half_extents`
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Only [`EMPTY`](Self::EMPTY) is empty; a zero-sized box elsewhere is a point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// The eight corners
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Transform by an affine matrix, re-fitting an axis-aligned box around
    /// the transformed corners.
    pub fn transformed(&self, m: Mat4) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        let corners = self.corners();
        let first = mat4::transform_point(m, corners[0]);
        let (min, max) = corners[1..].iter().fold((first, first), |(min, max), &c| {
            let p = mat4::transform_point(m, c);
            (min.min_components(p), max.max_components(p))
        });
        Self { min, max }
    }

    /// Smallest box containing both boxes
    pub fn merge(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            min: self.min.min_components(other.min),
            max: self.max.max_components(other.max),
        }
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x
            && p.y >= self.min.y && p.y <= self.max.y
            && p.z >= self.min.z && p.z <= self.max.z
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
            && self.min.y <= other.max.y && self.max.y >= other.min.y
            && self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

/// Bounding sphere
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// The empty sphere
    pub const EMPTY: Self = Self { center: Vec3::ZERO, radius: 0.0 };

    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere enclosing a box
    pub fn from_box(b: &BoundingBox) -> Self {
        if b.is_empty() {
            return Self::EMPTY;
        }
        let center = b.center();
        Self { center, radius: center.distance(b.max) }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.radius == 0.0 && self.center == Vec3::ZERO
    }

    /// Transform by an affine matrix. Non-uniform scale grows the radius by
    /// the largest axis scale, so the result stays conservative.
    pub fn transformed(&self, m: Mat4) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        Self {
            center: mat4::transform_point(m, self.center),
            radius: self.radius * mat4::max_scale(m),
        }
    }

    /// Smallest sphere containing both spheres
    pub fn merge(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let offset = other.center - self.center;
        let distance = offset.length();
        if distance + other.radius <= self.radius {
            return *self;
        }
        if distance + self.radius <= other.radius {
            return *other;
        }
        let radius = (distance + self.radius + other.radius) * 0.5;
        let center = self.center + offset * ((radius - self.radius) / distance);
        Self { center, radius }
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        self.center.distance(p) <= self.radius
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.center.distance(other.center) <= self.radius + other.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Quat;

    const EPSILON: f32 = 0.0001;

    fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
        (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON && (a.z - b.z).abs() < EPSILON
    }

    #[test]
    fn test_empty_box_stays_empty() {
        let m = mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        assert!(BoundingBox::EMPTY.transformed(m).is_empty());
    }

    #[test]
    fn test_point_box_is_not_empty() {
        let point = BoundingBox::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 2.0, 3.0));
        assert!(!point.is_empty());

        let t = point.transformed(mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        assert!(vec_approx_eq(t.min, Vec3::new(11.0, 2.0, 3.0)));
        assert!(vec_approx_eq(t.max, Vec3::new(11.0, 2.0, 3.0)));

        let s = BoundingSphere::from_box(&point);
        assert!(!s.is_empty());
        assert!(vec_approx_eq(s.center, Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(s.radius, 0.0);
    }

    #[test]
    fn test_box_translated() {
        let b = BoundingBox::new(Vec3::splat(-1.0), Vec3::ONE);
        let t = b.transformed(mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        assert!(vec_approx_eq(t.min, Vec3::new(4.0, -1.0, -1.0)));
        assert!(vec_approx_eq(t.max, Vec3::new(6.0, 1.0, 1.0)));
    }

    #[test]
    fn test_box_rotated_refits() {
        let b = BoundingBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let m = mat4::from_rotation(Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_2));
        let t = b.transformed(m);
        assert!(vec_approx_eq(t.min, Vec3::new(-1.0, 0.0, 0.0)), "got {:?}", t.min);
        assert!(vec_approx_eq(t.max, Vec3::new(0.0, 2.0, 1.0)), "got {:?}", t.max);
    }

    #[test]
    fn test_box_merge_with_empty() {
        let b = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(b.merge(&BoundingBox::EMPTY), b);
        assert_eq!(BoundingBox::EMPTY.merge(&b), b);
    }

    #[test]
    fn test_sphere_from_box() {
        let b = BoundingBox::new(Vec3::splat(-1.0), Vec3::ONE);
        let s = BoundingSphere::from_box(&b);
        assert!(vec_approx_eq(s.center, Vec3::ZERO));
        assert!((s.radius - 3.0f32.sqrt()).abs() < EPSILON);
    }

    #[test]
    fn test_sphere_transformed_scales_radius() {
        let s = BoundingSphere::new(Vec3::X, 1.0);
        let m = mat4::mul(
            mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)),
            mat4::from_scale(Vec3::new(2.0, 1.0, 1.0)),
        );
        let t = s.transformed(m);
        assert!(vec_approx_eq(t.center, Vec3::new(2.0, 3.0, 0.0)));
        assert!((t.radius - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_sphere_merge_contains_both() {
        let a = BoundingSphere::new(Vec3::ZERO, 1.0);
        let b = BoundingSphere::new(Vec3::new(4.0, 0.0, 0.0), 1.0);
        let m = a.merge(&b);
        assert!(vec_approx_eq(m.center, Vec3::new(2.0, 0.0, 0.0)));
        assert!((m.radius - 3.0).abs() < EPSILON);
    }
}

//! Per-node bounding volume selection

use serde::{Deserialize, Serialize};
use sprig_math::{BoundingBox, BoundingSphere, Mat4};

/// Which kind of world-space bounding volume a node maintains
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsType {
    #[default]
    None,
    Box,
    Sphere,
}

/// A world-space bounding volume
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundingVolume {
    None,
    Box(BoundingBox),
    Sphere(BoundingSphere),
}

impl BoundingVolume {
    /// Build the world-space volume of `kind` from a local box and a world matrix.
    pub fn from_local(kind: BoundsType, local: &BoundingBox, world: Mat4) -> Self {
        match kind {
            BoundsType::None => BoundingVolume::None,
            BoundsType::Box => BoundingVolume::Box(local.transformed(world)),
            BoundsType::Sphere => {
                BoundingVolume::Sphere(BoundingSphere::from_box(local).transformed(world))
            }
        }
    }

    pub fn bounds_type(&self) -> BoundsType {
        match self {
            BoundingVolume::None => BoundsType::None,
            BoundingVolume::Box(_) => BoundsType::Box,
            BoundingVolume::Sphere(_) => BoundsType::Sphere,
        }
    }

    pub fn as_box(&self) -> Option<&BoundingBox> {
        match self {
            BoundingVolume::Box(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_sphere(&self) -> Option<&BoundingSphere> {
        match self {
            BoundingVolume::Sphere(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_math::{mat4, Vec3};

    #[test]
    fn test_from_local_box() {
        let local = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
        let world = mat4::from_translation(Vec3::new(2.0, 0.0, 0.0));
        let volume = BoundingVolume::from_local(BoundsType::Box, &local, world);
        assert_eq!(volume.bounds_type(), BoundsType::Box);
        let b = volume.as_box().copied().unwrap();
        assert_eq!(b.min, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(b.max, Vec3::new(3.0, 1.0, 1.0));
        assert!(volume.as_sphere().is_none());
    }

    #[test]
    fn test_from_local_none() {
        let local = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
        let volume = BoundingVolume::from_local(BoundsType::None, &local, mat4::IDENTITY);
        assert_eq!(volume, BoundingVolume::None);
    }

    #[test]
    fn test_bounds_type_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            bounds: BoundsType,
        }
        let w: Wrapper = toml::from_str("bounds = \"sphere\"").unwrap();
        assert_eq!(w.bounds, BoundsType::Sphere);
    }
}

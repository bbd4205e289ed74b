//! 3D Mathematics Library
//!
//! This crate provides the vector, rotation, matrix and bounding-volume types
//! used by the Sprig scene graph.
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector with x, y, z components
//! - [`Quat`] - unit quaternion rotation
//! - [`Mat4`] - column-major 4x4 matrix, with helpers in [`mat4`]
//!
//! ## Bounding Volumes
//!
//! - [`BoundingBox`] - axis-aligned box
//! - [`BoundingSphere`] - sphere

mod vec3;
mod quat;
pub mod mat4;
pub mod bounds;

pub use vec3::Vec3;
pub use quat::Quat;
pub use mat4::Mat4;
pub use bounds::{BoundingBox, BoundingSphere};

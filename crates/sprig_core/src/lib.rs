//! Core types for the Sprig scene graph
//!
//! This crate provides the node hierarchy and everything attached to it:
//!
//! - [`World`] - Arena owning all nodes and scenes
//! - [`NodeKey`] / [`SceneKey`] - Generational keys into the world
//! - [`Node`] / [`NodeRef`] - A node, and a borrowed view with cached world,
//!   view and projection matrices
//! - [`Transform`] - Local translation, rotation and scale
//! - [`TransformListener`] - Callback for transform changes
//! - [`Scene`] - Root nodes plus the active camera
//! - [`Camera`], [`Light`], [`Model`], [`ParticleEmitter`] - Shared components
//! - [`audio`] - Audio sources that follow their node

pub mod audio;
mod bounding;
mod components;
mod error;
mod node;
mod scene;
mod transform;
mod world;

pub use bounding::{BoundingVolume, BoundsType};
pub use components::{Camera, Light, LightKind, Model, ParticleEmitter, Projection};
pub use error::SceneError;
pub use node::{DirtyBits, Node, NodeKind, NodeRef};
pub use scene::Scene;
pub use transform::{Transform, TransformListener};
pub use world::{CacheStats, NodeKey, SceneKey, TransformMut, World};

// Re-export commonly used types from sprig_math for convenience
pub use sprig_math::{mat4, BoundingBox, BoundingSphere, Mat4, Quat, Vec3};

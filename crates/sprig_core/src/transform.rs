//! Local transform (translation, rotation, scale) and change listeners
//!
//! A [`Transform`] is the local placement of a node relative to its parent.
//! Anything that needs to react when a transform changes implements
//! [`TransformListener`] and registers through
//! [`World::add_transform_listener`](crate::World::add_transform_listener).

use std::fmt;
use std::rc::{Rc, Weak};

use sprig_math::{mat4, Mat4, Quat, Vec3};

use crate::world::{NodeKey, World};

/// Receives a callback when a node's transform changes.
///
/// Callbacks run synchronously on the mutating thread, after the node's
/// cached matrices have been invalidated, so implementations may query any
/// matrix through `world`.
pub trait TransformListener {
    /// `node` is the node whose transform (or world placement) changed.
    fn transform_changed(&self, world: &World, node: NodeKey);
}

/// A local transform with translation, rotation and non-uniform scale
pub struct Transform {
    /// Translation relative to the parent
    pub translation: Vec3,
    /// Rotation relative to the parent
    pub rotation: Quat,
    /// Per-axis scale
    pub scale: Vec3,
    listeners: Vec<Weak<dyn TransformListener>>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

// Listeners are registrations on one particular transform; copies start clean.
impl Clone for Transform {
    fn clone(&self) -> Self {
        Self::new(self.translation, self.rotation, self.scale)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("translation", &self.translation)
            .field("rotation", &self.rotation)
            .field("scale", &self.scale)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Transform {
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
            listeners: Vec::new(),
        }
    }

    /// Create an identity transform (no translation, rotation, or scale change)
    pub fn identity() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }

    /// Create a transform with just a translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::IDENTITY, Vec3::ONE)
    }

    /// The combined local matrix: Translation * Rotation * Scale
    pub fn matrix(&self) -> Mat4 {
        mat4::from_trs(self.translation, self.rotation, self.scale)
    }

    /// Transform a point from local space to parent space
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.rotate(p.component_mul(self.scale)) + self.translation
    }

    /// Translate by an offset
    pub fn translate(&mut self, offset: Vec3) {
        self.translation += offset;
    }

    /// Apply a rotation on top of the current one
    pub fn rotate(&mut self, rotation: Quat) {
        self.rotation = rotation.compose(&self.rotation).normalize();
    }

    /// Set the same scale on all three axes
    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.scale = Vec3::splat(scale);
    }

    /// Register a listener. Dead registrations are dropped on the way.
    pub fn add_listener(&mut self, listener: Weak<dyn TransformListener>) {
        self.listeners.retain(|l| l.strong_count() > 0);
        self.listeners.push(listener);
    }

    /// Remove a previously registered listener.
    ///
    /// Returns `true` if it was registered.
    pub fn remove_listener(&mut self, listener: &Rc<dyn TransformListener>) -> bool {
        let target = Rc::downgrade(listener);
        let before = self.listeners.len();
        self.listeners.retain(|l| !Weak::ptr_eq(l, &target) && l.strong_count() > 0);
        before != self.listeners.len()
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.iter().filter(|l| l.strong_count() > 0).count()
    }

    /// Invoke every live listener in registration order.
    pub(crate) fn notify_listeners(&self, world: &World, node: NodeKey) {
        for listener in self.listeners.iter().filter_map(Weak::upgrade) {
            listener.transform_changed(world, node);
        }
    }
}

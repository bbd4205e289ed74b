//! Scene graph nodes and cached matrix derivation
//!
//! A [`Node`] owns its local [`Transform`], its place in the hierarchy and a
//! set of lazily recomputed derived values. Each derived value has a bit in
//! [`DirtyBits`]; a set bit means the cached value is stale. Structural and
//! transform changes only set bits. Reading through a [`NodeRef`] recomputes
//! what is stale and clears exactly the bits it refreshed.

use std::cell::Cell;
use std::ops::Deref;
use std::rc::Rc;

use bitflags::bitflags;
use sprig_math::{mat4, BoundingBox, BoundingSphere, Mat4, Vec3};

use crate::audio::AudioSource;
use crate::bounding::{BoundingVolume, BoundsType};
use crate::components::{Camera, Light, Model, ParticleEmitter};
use crate::transform::Transform;
use crate::world::{NodeKey, SceneKey, World};

bitflags! {
    /// Flags marking which cached values of a node are stale
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DirtyBits: u16 {
        /// Nothing is stale
        const NONE = 0;
        /// World matrix
        const WORLD = 1 << 0;
        /// Inverse-transpose of world-view (normal matrix)
        const INVERSE_TRANSPOSE_WORLD_VIEW = 1 << 1;
        const VIEW = 1 << 2;
        const INVERSE_VIEW = 1 << 3;
        const PROJECTION = 1 << 4;
        const VIEW_PROJECTION = 1 << 5;
        const INVERSE_VIEW_PROJECTION = 1 << 6;
        const WORLD_VIEW_PROJECTION = 1 << 7;
        /// World-space bounding volume
        const BOUNDS = 1 << 8;
        /// Everything derived from the active camera
        const CAMERA_DEPENDENT = Self::INVERSE_TRANSPOSE_WORLD_VIEW.bits()
            | Self::VIEW.bits()
            | Self::INVERSE_VIEW.bits()
            | Self::PROJECTION.bits()
            | Self::VIEW_PROJECTION.bits()
            | Self::INVERSE_VIEW_PROJECTION.bits()
            | Self::WORLD_VIEW_PROJECTION.bits();
        /// All flags set - every cached value is stale
        const ALL = Self::WORLD.bits() | Self::CAMERA_DEPENDENT.bits() | Self::BOUNDS.bits();
    }
}

/// Role of a node in the graph
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeKind {
    #[default]
    Node,
    /// A skeleton joint
    Joint,
}

/// Inputs the camera-dependent caches were computed from.
///
/// A mismatch against the current inputs means those caches are stale even
/// if no bit was set on this node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CameraStamp {
    camera_node: Option<NodeKey>,
    camera_serial: u64,
    camera_revision: u64,
    transform_revision: u64,
}

#[derive(Debug)]
pub(crate) struct MatrixCache {
    world: Cell<Mat4>,
    inverse_transpose_world_view: Cell<Mat4>,
    view: Cell<Mat4>,
    inverse_view: Cell<Mat4>,
    projection: Cell<Mat4>,
    view_projection: Cell<Mat4>,
    inverse_view_projection: Cell<Mat4>,
    world_view_projection: Cell<Mat4>,
}

impl Default for MatrixCache {
    fn default() -> Self {
        Self {
            world: Cell::new(mat4::IDENTITY),
            inverse_transpose_world_view: Cell::new(mat4::IDENTITY),
            view: Cell::new(mat4::IDENTITY),
            inverse_view: Cell::new(mat4::IDENTITY),
            projection: Cell::new(mat4::IDENTITY),
            view_projection: Cell::new(mat4::IDENTITY),
            inverse_view_projection: Cell::new(mat4::IDENTITY),
            world_view_projection: Cell::new(mat4::IDENTITY),
        }
    }
}

/// A node in the scene graph.
///
/// Nodes live inside a [`World`] and are addressed by [`NodeKey`]. Read
/// access with derived matrices goes through [`World::node`]; structural
/// edits and transform edits go through [`World`] methods so the affected
/// caches can be invalidated.
#[derive(Debug)]
pub struct Node {
    pub(crate) id: String,
    pub(crate) kind: NodeKind,
    pub(crate) transform: Transform,

    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    pub(crate) scene: Option<SceneKey>,

    pub(crate) camera: Option<Rc<Camera>>,
    pub(crate) light: Option<Rc<Light>>,
    pub(crate) model: Option<Rc<Model>>,
    pub(crate) audio_source: Option<Rc<AudioSource>>,
    pub(crate) particle_emitter: Option<Rc<ParticleEmitter>>,

    pub(crate) dirty: Cell<DirtyBits>,
    pub(crate) cache: MatrixCache,
    pub(crate) camera_stamp: Cell<Option<CameraStamp>>,
    pub(crate) bounds_type: BoundsType,
    /// `None` until first requested
    pub(crate) bounds: Cell<Option<BoundingVolume>>,
    pub(crate) notify_hierarchy_changed: bool,
}

impl Node {
    pub(crate) fn new(id: Option<&str>, kind: NodeKind, bounds_type: BoundsType) -> Self {
        Self {
            id: id.unwrap_or_default().to_string(),
            kind,
            transform: Transform::identity(),
            parent: None,
            children: Vec::new(),
            scene: None,
            camera: None,
            light: None,
            model: None,
            audio_source: None,
            particle_emitter: None,
            dirty: Cell::new(DirtyBits::ALL),
            cache: MatrixCache::default(),
            camera_stamp: Cell::new(None),
            bounds_type,
            bounds: Cell::new(None),
            notify_hierarchy_changed: true,
        }
    }

    /// Copy of this node's own state for cloning: same id, kind, local
    /// transform, bounds type and shared components. Audio sources are bound
    /// to a single node and are not carried over.
    pub(crate) fn detached_copy(&self) -> Self {
        let mut copy = Self::new(Some(&self.id), self.kind, self.bounds_type);
        copy.transform = self.transform.clone();
        copy.camera = self.camera.clone();
        copy.light = self.light.clone();
        copy.model = self.model.clone();
        copy.particle_emitter = self.particle_emitter.clone();
        copy
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Local transform. Mutate it through [`World::transform_mut`].
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn parent_key(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Direct children in insertion order
    pub fn child_keys(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Scene that owns the root of this node's hierarchy
    pub fn scene(&self) -> Option<SceneKey> {
        self.scene
    }

    pub fn camera(&self) -> Option<&Rc<Camera>> {
        self.camera.as_ref()
    }

    pub fn light(&self) -> Option<&Rc<Light>> {
        self.light.as_ref()
    }

    pub fn model(&self) -> Option<&Rc<Model>> {
        self.model.as_ref()
    }

    pub fn audio_source(&self) -> Option<&Rc<AudioSource>> {
        self.audio_source.as_ref()
    }

    pub fn particle_emitter(&self) -> Option<&Rc<ParticleEmitter>> {
        self.particle_emitter.as_ref()
    }

    pub fn bounds_type(&self) -> BoundsType {
        self.bounds_type
    }

    /// Select the kind of bounding volume this node maintains. Changing it
    /// discards the cached volume.
    pub fn set_bounds_type(&mut self, bounds_type: BoundsType) {
        if self.bounds_type != bounds_type {
            self.bounds_type = bounds_type;
            self.bounds.set(None);
            self.mark_dirty(DirtyBits::BOUNDS);
        }
    }

    /// Whether the hierarchy-changed notification is currently enabled
    pub fn notifies_hierarchy_changed(&self) -> bool {
        self.notify_hierarchy_changed
    }

    pub fn dirty_bits(&self) -> DirtyBits {
        self.dirty.get()
    }

    /// True if any of `bits` is stale
    #[inline]
    pub fn is_dirty(&self, bits: DirtyBits) -> bool {
        self.dirty.get().intersects(bits)
    }

    #[inline]
    pub(crate) fn mark_dirty(&self, bits: DirtyBits) {
        self.dirty.set(self.dirty.get() | bits);
    }

    #[inline]
    pub(crate) fn clear_dirty(&self, bits: DirtyBits) {
        self.dirty.set(self.dirty.get() - bits);
    }
}

pub(crate) fn id_matches(candidate: &str, id: &str, exact: bool) -> bool {
    if exact {
        candidate == id
    } else {
        candidate.starts_with(id)
    }
}

/// Borrowed view of a node inside its [`World`].
///
/// Dereferences to [`Node`] and adds everything that needs the rest of the
/// graph: hierarchy navigation, search and derived matrices.
#[derive(Clone, Copy)]
pub struct NodeRef<'w> {
    world: &'w World,
    key: NodeKey,
    node: &'w Node,
}

impl<'w> Deref for NodeRef<'w> {
    type Target = Node;

    fn deref(&self) -> &Node {
        self.node
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", &self.key)
            .field("id", &self.node.id)
            .finish()
    }
}

impl<'w> NodeRef<'w> {
    pub(crate) fn new(world: &'w World, key: NodeKey, node: &'w Node) -> Self {
        Self { world, key, node }
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn node(&self) -> &'w Node {
        self.node
    }

    pub fn parent(&self) -> Option<NodeRef<'w>> {
        self.world.node(self.node.parent?)
    }

    /// Direct children in insertion order
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'w>> + 'w {
        let world = self.world;
        self.node.children.iter().filter_map(move |&k| world.node(k))
    }

    /// Topmost ancestor (the node itself when it has no parent)
    pub fn root_node(&self) -> NodeRef<'w> {
        let mut current = *self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// First node whose id matches, searching this node first and then its
    /// descendants in pre-order. Without `recursive` only direct children
    /// are considered. `exact == false` matches by prefix.
    pub fn find_node(&self, id: &str, recursive: bool, exact: bool) -> Option<NodeRef<'w>> {
        if id_matches(&self.node.id, id, exact) {
            return Some(*self);
        }
        let mut stack: Vec<NodeKey> = self.node.children.iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            let Some(node) = self.world.node(key) else { continue };
            if id_matches(&node.id, id, exact) {
                return Some(node);
            }
            if recursive {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        None
    }

    /// Append every matching node to `out` in the same order
    /// [`find_node`](Self::find_node) visits them. Returns the number appended.
    pub fn find_nodes(&self, id: &str, out: &mut Vec<NodeKey>, recursive: bool, exact: bool) -> usize {
        let before = out.len();
        if id_matches(&self.node.id, id, exact) {
            out.push(self.key);
        }
        let mut stack: Vec<NodeKey> = self.node.children.iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            let Some(node) = self.world.nodes.get(key) else { continue };
            if id_matches(&node.id, id, exact) {
                out.push(key);
            }
            if recursive {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out.len() - before
    }

    /// World matrix: parent world times local, or local for a root.
    pub fn world_matrix(&self) -> Mat4 {
        if !self.node.is_dirty(DirtyBits::WORLD) {
            return self.node.cache.world.get();
        }

        // Walk up to the first ancestor with a valid world matrix, then
        // resolve back down. Every node on the way is stale too.
        let nodes = &self.world.nodes;
        let mut chain = vec![self.node];
        let mut base = None;
        let mut cursor = self.node.parent;
        while let Some(key) = cursor {
            let Some(ancestor) = nodes.get(key) else { break };
            if !ancestor.is_dirty(DirtyBits::WORLD) {
                base = Some(ancestor.cache.world.get());
                break;
            }
            chain.push(ancestor);
            cursor = ancestor.parent;
        }

        let mut world = mat4::IDENTITY;
        for node in chain.iter().rev() {
            let local = node.transform.matrix();
            world = match base {
                Some(parent) => mat4::mul(parent, local),
                None => local,
            };
            node.cache.world.set(world);
            node.clear_dirty(DirtyBits::WORLD);
            self.world.record_world_recompute();
            base = Some(world);
        }
        world
    }

    /// Translation part of the world matrix
    pub fn world_translation(&self) -> Vec3 {
        mat4::get_translation(self.world_matrix())
    }

    /// The active camera of this node's scene, if it has one and the camera
    /// node carries a camera component.
    fn active_camera(&self) -> Option<(NodeRef<'w>, &'w Rc<Camera>)> {
        let scene = self.world.scenes.get(self.node.scene?)?;
        let camera_node = self.world.node(scene.active_camera?)?;
        let camera = camera_node.node.camera.as_ref()?;
        Some((camera_node, camera))
    }

    /// Compare the camera inputs against what the caches were built from,
    /// marking every camera-dependent value stale on mismatch.
    fn sync_camera_stamp(&self) -> Option<(NodeRef<'w>, &'w Rc<Camera>)> {
        let active = self.active_camera();
        let stamp = CameraStamp {
            camera_node: active.map(|(n, _)| n.key),
            camera_serial: active.map_or(0, |(_, c)| c.serial()),
            camera_revision: active.map_or(0, |(_, c)| c.revision()),
            transform_revision: self.world.transform_revision(),
        };
        if self.node.camera_stamp.get() != Some(stamp) {
            self.node.mark_dirty(DirtyBits::CAMERA_DEPENDENT);
            self.node.camera_stamp.set(Some(stamp));
        }
        active
    }

    /// Refresh one cached matrix if its bit is set, and return it.
    fn cached(&self, bit: DirtyBits, cell: &Cell<Mat4>, compute: impl FnOnce() -> Mat4) -> Mat4 {
        if self.node.is_dirty(bit) {
            cell.set(compute());
            self.node.clear_dirty(bit);
            self.world.record_camera_recompute();
        }
        cell.get()
    }

    /// Inverse of the active camera node's world matrix; identity without a camera.
    pub fn view_matrix(&self) -> Mat4 {
        let active = self.sync_camera_stamp();
        self.cached(DirtyBits::VIEW, &self.node.cache.view, || match active {
            Some((camera_node, _)) => {
                mat4::inverse(camera_node.world_matrix()).unwrap_or(mat4::IDENTITY)
            }
            None => mat4::IDENTITY,
        })
    }

    /// The active camera node's world matrix; identity without a camera.
    pub fn inverse_view_matrix(&self) -> Mat4 {
        let active = self.sync_camera_stamp();
        self.cached(DirtyBits::INVERSE_VIEW, &self.node.cache.inverse_view, || match active {
            Some((camera_node, _)) => camera_node.world_matrix(),
            None => mat4::IDENTITY,
        })
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let active = self.sync_camera_stamp();
        self.cached(DirtyBits::PROJECTION, &self.node.cache.projection, || match active {
            Some((_, camera)) => camera.projection_matrix(),
            None => mat4::IDENTITY,
        })
    }

    /// Projection times view
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.sync_camera_stamp();
        self.cached(DirtyBits::VIEW_PROJECTION, &self.node.cache.view_projection, || {
            mat4::mul(self.projection_matrix(), self.view_matrix())
        })
    }

    pub fn inverse_view_projection_matrix(&self) -> Mat4 {
        self.sync_camera_stamp();
        self.cached(
            DirtyBits::INVERSE_VIEW_PROJECTION,
            &self.node.cache.inverse_view_projection,
            || mat4::inverse(self.view_projection_matrix()).unwrap_or(mat4::IDENTITY),
        )
    }

    /// Projection times view times world. Equals the world matrix when
    /// there is no active camera.
    pub fn world_view_projection_matrix(&self) -> Mat4 {
        self.sync_camera_stamp();
        self.cached(
            DirtyBits::WORLD_VIEW_PROJECTION,
            &self.node.cache.world_view_projection,
            || mat4::mul(self.view_projection_matrix(), self.world_matrix()),
        )
    }

    /// Inverse-transpose of view times world, for transforming normals
    pub fn inverse_transpose_world_view_matrix(&self) -> Mat4 {
        self.sync_camera_stamp();
        self.cached(
            DirtyBits::INVERSE_TRANSPOSE_WORLD_VIEW,
            &self.node.cache.inverse_transpose_world_view,
            || {
                let world_view = mat4::mul(self.view_matrix(), self.world_matrix());
                mat4::transpose(mat4::inverse(world_view).unwrap_or(mat4::IDENTITY))
            },
        )
    }

    /// World-space bounding volume of the attached model, in the form the
    /// node's [`BoundsType`] selects. Empty when no model is attached.
    pub fn bounding_volume(&self) -> BoundingVolume {
        if self.node.bounds_type == BoundsType::None {
            return BoundingVolume::None;
        }
        if let Some(volume) = self.node.bounds.get() {
            if !self.node.is_dirty(DirtyBits::BOUNDS) {
                return volume;
            }
        }

        let local = self
            .node
            .model
            .as_ref()
            .map_or(BoundingBox::EMPTY, |m| m.bounding_box());
        let volume = BoundingVolume::from_local(self.node.bounds_type, &local, self.world_matrix());
        self.node.bounds.set(Some(volume));
        self.node.clear_dirty(DirtyBits::BOUNDS);
        self.world.record_bounds_recompute();
        volume
    }

    /// World-space box, or the empty box when the node does not maintain one
    pub fn bounding_box(&self) -> BoundingBox {
        match self.bounding_volume() {
            BoundingVolume::Box(b) => b,
            _ => BoundingBox::EMPTY,
        }
    }

    /// World-space sphere, or the empty sphere when the node does not maintain one
    pub fn bounding_sphere(&self) -> BoundingSphere {
        match self.bounding_volume() {
            BoundingVolume::Sphere(s) => s,
            _ => BoundingSphere::EMPTY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_fully_dirty() {
        let node = Node::new(Some("a"), NodeKind::Node, BoundsType::None);
        assert_eq!(node.dirty_bits(), DirtyBits::ALL);
        assert_eq!(node.id(), "a");
        assert!(node.parent_key().is_none());
        assert!(!node.has_children());
    }

    #[test]
    fn test_missing_id_is_empty() {
        let node = Node::new(None, NodeKind::Joint, BoundsType::None);
        assert_eq!(node.id(), "");
        assert_eq!(node.kind(), NodeKind::Joint);
    }

    #[test]
    fn test_clear_dirty_only_touches_given_bits() {
        let node = Node::new(None, NodeKind::Node, BoundsType::None);
        node.clear_dirty(DirtyBits::WORLD);
        assert!(!node.is_dirty(DirtyBits::WORLD));
        assert!(node.is_dirty(DirtyBits::VIEW));
        assert!(node.is_dirty(DirtyBits::BOUNDS));
    }

    #[test]
    fn test_camera_dependent_excludes_world_and_bounds() {
        assert!(!DirtyBits::CAMERA_DEPENDENT.contains(DirtyBits::WORLD));
        assert!(!DirtyBits::CAMERA_DEPENDENT.contains(DirtyBits::BOUNDS));
        assert!(DirtyBits::ALL.contains(DirtyBits::CAMERA_DEPENDENT));
    }

    #[test]
    fn test_set_bounds_type_discards_cache() {
        let mut node = Node::new(None, NodeKind::Node, BoundsType::Box);
        node.bounds.set(Some(BoundingVolume::Box(BoundingBox::EMPTY)));
        node.clear_dirty(DirtyBits::BOUNDS);

        node.set_bounds_type(BoundsType::Sphere);
        assert!(node.bounds.get().is_none());
        assert!(node.is_dirty(DirtyBits::BOUNDS));
    }

    #[test]
    fn test_id_matching() {
        assert!(id_matches("arm_left", "arm", false));
        assert!(!id_matches("arm_left", "arm", true));
        assert!(id_matches("arm", "arm", true));
        assert!(!id_matches("leg", "arm", false));
    }
}

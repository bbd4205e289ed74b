//! World: arena owning every node and scene
//!
//! All structural edits (parenting, scene membership, component attachment)
//! and transform edits go through the World so it can invalidate the cached
//! values of exactly the nodes they affect.

use std::cell::Cell;
use std::ops::{Deref, DerefMut};
use std::rc::{Rc, Weak};

use log::{debug, trace, warn};
use slotmap::SlotMap;
use sprig_math::{Quat, Vec3};

use crate::audio::AudioSource;
use crate::bounding::BoundsType;
use crate::components::{Camera, Light, Model, ParticleEmitter};
use crate::error::SceneError;
use crate::node::{id_matches, DirtyBits, Node, NodeKind, NodeRef};
use crate::scene::Scene;
use crate::transform::{Transform, TransformListener};

slotmap::new_key_type! {
    /// Key to a node in a [`World`]
    pub struct NodeKey;
    /// Key to a scene in a [`World`]
    pub struct SceneKey;
}

/// Counters of cached values that had to be recomputed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// World matrix recomputations
    pub world_matrices: u64,
    /// View, projection and other camera-dependent recomputations
    pub camera_matrices: u64,
    /// Bounding volume recomputations
    pub bounds: u64,
}

/// Container for all nodes and scenes
pub struct World {
    pub(crate) nodes: SlotMap<NodeKey, Node>,
    pub(crate) scenes: SlotMap<SceneKey, Scene>,
    default_bounds_type: BoundsType,
    /// Bumped on every world-placement change anywhere in the world
    transform_revision: Cell<u64>,
    stats: Cell<CacheStats>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a world with pre-allocated capacity for nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(capacity),
            scenes: SlotMap::with_key(),
            default_bounds_type: BoundsType::None,
            transform_revision: Cell::new(0),
            stats: Cell::new(CacheStats::default()),
        }
    }

    /// Bounds type given to newly created nodes
    pub fn with_default_bounds_type(mut self, bounds_type: BoundsType) -> Self {
        self.default_bounds_type = bounds_type;
        self
    }

    // --- Nodes ---

    /// Create a detached node with an identity transform
    pub fn create_node<'a>(&mut self, id: impl Into<Option<&'a str>>) -> NodeKey {
        self.insert_node(id.into(), NodeKind::Node)
    }

    /// Create a detached skeleton joint
    pub fn create_joint<'a>(&mut self, id: impl Into<Option<&'a str>>) -> NodeKey {
        self.insert_node(id.into(), NodeKind::Joint)
    }

    fn insert_node(&mut self, id: Option<&str>, kind: NodeKind) -> NodeKey {
        let key = self.nodes.insert(Node::new(id, kind, self.default_bounds_type));
        trace!("Created {:?} {:?} ({:?})", kind, key, id);
        key
    }

    /// Read access to a node, with hierarchy navigation and derived matrices
    pub fn node(&self, key: NodeKey) -> Option<NodeRef<'_>> {
        self.nodes.get(key).map(|node| NodeRef::new(self, key, node))
    }

    /// Mutable access for edits that do not affect the hierarchy or transforms
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.nodes.iter().map(move |(key, node)| NodeRef::new(self, key, node))
    }

    /// Keys of `key` and all its descendants in pre-order
    pub fn subtree(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut visited = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            let Some(node) = self.nodes.get(k) else { continue };
            visited.push(k);
            stack.extend(node.children.iter().rev().copied());
        }
        visited
    }

    fn check_node(&self, key: NodeKey) -> Result<(), SceneError> {
        if self.nodes.contains_key(key) {
            Ok(())
        } else {
            Err(SceneError::InvalidNode(key))
        }
    }

    fn check_scene(&self, key: SceneKey) -> Result<(), SceneError> {
        if self.scenes.contains_key(key) {
            Ok(())
        } else {
            Err(SceneError::InvalidScene(key))
        }
    }

    // --- Transforms ---

    /// Mutable access to a node's local transform.
    ///
    /// Change notification fires once, when the guard is dropped, and only
    /// if the transform was mutably accessed.
    pub fn transform_mut(&mut self, key: NodeKey) -> Option<TransformMut<'_>> {
        if !self.nodes.contains_key(key) {
            return None;
        }
        Some(TransformMut { world: self, key, changed: false })
    }

    fn edit_transform(&mut self, key: NodeKey, edit: impl FnOnce(&mut Transform)) -> Result<(), SceneError> {
        let mut transform = self.transform_mut(key).ok_or(SceneError::InvalidNode(key))?;
        edit(&mut *transform);
        Ok(())
    }

    pub fn translate(&mut self, key: NodeKey, offset: Vec3) -> Result<(), SceneError> {
        self.edit_transform(key, |t| t.translate(offset))
    }

    pub fn set_translation(&mut self, key: NodeKey, translation: Vec3) -> Result<(), SceneError> {
        self.edit_transform(key, |t| t.translation = translation)
    }

    pub fn rotate(&mut self, key: NodeKey, rotation: Quat) -> Result<(), SceneError> {
        self.edit_transform(key, |t| t.rotate(rotation))
    }

    pub fn set_rotation(&mut self, key: NodeKey, rotation: Quat) -> Result<(), SceneError> {
        self.edit_transform(key, |t| t.rotation = rotation)
    }

    pub fn set_scale(&mut self, key: NodeKey, scale: Vec3) -> Result<(), SceneError> {
        self.edit_transform(key, |t| t.scale = scale)
    }

    /// Replace translation, rotation and scale in one notification.
    /// Listeners registered on the node are kept.
    pub fn set_transform(&mut self, key: NodeKey, transform: &Transform) -> Result<(), SceneError> {
        self.edit_transform(key, |t| {
            t.translation = transform.translation;
            t.rotation = transform.rotation;
            t.scale = transform.scale;
        })
    }

    pub fn add_transform_listener(
        &mut self,
        key: NodeKey,
        listener: Weak<dyn TransformListener>,
    ) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(key).ok_or(SceneError::InvalidNode(key))?;
        node.transform.add_listener(listener);
        Ok(())
    }

    /// Returns whether the listener was registered
    pub fn remove_transform_listener(
        &mut self,
        key: NodeKey,
        listener: &Rc<dyn TransformListener>,
    ) -> Result<bool, SceneError> {
        let node = self.nodes.get_mut(key).ok_or(SceneError::InvalidNode(key))?;
        Ok(node.transform.remove_listener(listener))
    }

    /// The world placement of `key` changed: mark every cached value of the
    /// node and its whole subtree stale, let attached audio sources follow
    /// their nodes, then notify the transform listeners of every node in the
    /// subtree, all in pre-order.
    pub(crate) fn transform_changed(&self, key: NodeKey) {
        self.transform_revision.set(self.transform_revision.get() + 1);

        let subtree = self.subtree(key);
        for &k in &subtree {
            self.nodes[k].mark_dirty(DirtyBits::ALL);
        }
        trace!("Transform changed on {:?}: {} node(s) invalidated", key, subtree.len());

        for &k in &subtree {
            // A source re-attached elsewhere still sits in its old slot until replaced
            if let Some(source) = self.nodes[k].audio_source.clone().filter(|s| s.node() == Some(k)) {
                source.transform_changed(self, k);
            }
        }
        for &k in &subtree {
            if let Some(node) = self.nodes.get(k) {
                node.transform.notify_listeners(self, k);
            }
        }
    }

    pub(crate) fn transform_revision(&self) -> u64 {
        self.transform_revision.get()
    }

    // --- Hierarchy ---

    /// Attach `child` as the last child of `parent`, detaching it from its
    /// previous parent or scene first.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), SceneError> {
        self.check_node(parent)?;
        self.check_node(child)?;
        if parent == child || self.is_ancestor(child, parent) {
            return Err(SceneError::CycleDetected { parent, child });
        }

        let old_parent = self.nodes[child].parent;
        if old_parent == Some(parent) {
            return Ok(());
        }
        match old_parent {
            Some(old) => {
                self.nodes[old].children.retain(|&k| k != child);
                self.nodes[child].parent = None;
                self.child_removed(old, child);
            }
            None => {
                if let Some(scene) = self.nodes[child].scene {
                    self.remove_scene_root(scene, child);
                }
            }
        }

        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        self.child_added(parent, child);
        self.parent_changed(child, old_parent);
        Ok(())
    }

    /// Detach a direct child. The child becomes a parentless node outside any scene.
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), SceneError> {
        self.check_node(parent)?;
        self.check_node(child)?;
        if self.nodes[child].parent != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.detach_child(parent, child);
        Ok(())
    }

    /// Detach every child of `parent`, with a single hierarchy-changed
    /// notification at the end. Returns the number of children removed.
    pub fn remove_all_children(&mut self, parent: NodeKey) -> Result<usize, SceneError> {
        self.check_node(parent)?;
        let children = std::mem::take(&mut self.nodes[parent].children);

        self.nodes[parent].notify_hierarchy_changed = false;
        for &child in &children {
            self.nodes[child].parent = None;
            self.child_removed(parent, child);
            self.parent_changed(child, Some(parent));
        }
        self.nodes[parent].notify_hierarchy_changed = true;

        if !children.is_empty() {
            self.hierarchy_changed(parent);
        }
        Ok(children.len())
    }

    fn detach_child(&mut self, parent: NodeKey, child: NodeKey) {
        self.nodes[parent].children.retain(|&k| k != child);
        self.nodes[child].parent = None;
        self.child_removed(parent, child);
        self.parent_changed(child, Some(parent));
    }

    /// True if `ancestor` is a strict ancestor of `node`
    pub fn is_ancestor(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut cursor = self.nodes.get(node).and_then(|n| n.parent);
        while let Some(key) = cursor {
            if key == ancestor {
                return true;
            }
            cursor = self.nodes.get(key).and_then(|n| n.parent);
        }
        false
    }

    /// Destroy a node and its whole subtree, releasing every component they
    /// hold. Returns the number of nodes destroyed.
    pub fn destroy_node(&mut self, key: NodeKey) -> Result<usize, SceneError> {
        self.check_node(key)?;
        if let Some(parent) = self.nodes[key].parent {
            self.detach_child(parent, key);
        } else if let Some(scene) = self.nodes[key].scene {
            self.remove_scene_root(scene, key);
        }

        let doomed = self.subtree(key);
        for scene in self.scenes.values_mut() {
            if scene.active_camera.is_some_and(|c| doomed.contains(&c)) {
                scene.active_camera = None;
            }
        }
        for &k in &doomed {
            if let Some(node) = self.nodes.remove(k) {
                if let Some(source) = &node.audio_source {
                    if source.node() == Some(k) {
                        source.set_node(None);
                    }
                }
            }
        }
        debug!("Destroyed {} node(s) under {:?}", doomed.len(), key);
        Ok(doomed.len())
    }

    /// Deep-copy a node and its subtree into new detached nodes.
    ///
    /// Ids, local transforms, bounds types and shared components are copied;
    /// transform listeners and audio sources are not.
    pub fn clone_node(&mut self, key: NodeKey) -> Result<NodeKey, SceneError> {
        self.check_node(key)?;
        let mut root = None;
        let mut stack: Vec<(NodeKey, Option<NodeKey>)> = vec![(key, None)];
        while let Some((source, parent)) = stack.pop() {
            let Some(original) = self.nodes.get(source) else { continue };
            let copy = original.detached_copy();
            let children = original.children.clone();
            let copy_key = self.nodes.insert(copy);
            match parent {
                Some(p) => {
                    self.nodes[p].children.push(copy_key);
                    self.nodes[copy_key].parent = Some(p);
                }
                None => root = Some(copy_key),
            }
            stack.extend(children.iter().rev().map(|&c| (c, Some(copy_key))));
        }
        root.ok_or(SceneError::InvalidNode(key))
    }

    // --- Hierarchy hooks ---

    fn child_added(&mut self, parent: NodeKey, child: NodeKey) {
        trace!("{:?} added under {:?}", child, parent);
        self.hierarchy_changed(parent);
    }

    fn child_removed(&mut self, parent: NodeKey, child: NodeKey) {
        trace!("{:?} removed from {:?}", child, parent);
        self.hierarchy_changed(parent);
    }

    /// The node moved under a different parent (or none): it now belongs to
    /// the new parent's scene and its world placement is unknown.
    fn parent_changed(&mut self, child: NodeKey, old_parent: Option<NodeKey>) {
        let scene = self.nodes[child]
            .parent
            .and_then(|p| self.nodes.get(p))
            .and_then(|p| p.scene);
        self.set_subtree_scene(child, scene);
        trace!("{:?} reparented from {:?}", child, old_parent);
        self.transform_changed(child);
    }

    fn hierarchy_changed(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.get(key) else { return };
        if !node.notify_hierarchy_changed {
            return;
        }
        if let Some(scene) = node.scene.and_then(|s| self.scenes.get_mut(s)) {
            scene.hierarchy_revision += 1;
        }
    }

    fn set_subtree_scene(&mut self, key: NodeKey, scene: Option<SceneKey>) {
        for k in self.subtree(key) {
            self.nodes[k].scene = scene;
        }
    }

    fn remove_scene_root(&mut self, scene: SceneKey, node: NodeKey) {
        if let Some(s) = self.scenes.get_mut(scene) {
            if s.remove_root(node) {
                s.hierarchy_revision += 1;
            }
        }
    }

    // --- Components ---

    pub fn set_camera(&mut self, key: NodeKey, camera: Option<Rc<Camera>>) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(key).ok_or(SceneError::InvalidNode(key))?;
        if !same_component(&node.camera, &camera) {
            node.camera = camera;
        }
        Ok(())
    }

    pub fn set_light(&mut self, key: NodeKey, light: Option<Rc<Light>>) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(key).ok_or(SceneError::InvalidNode(key))?;
        if !same_component(&node.light, &light) {
            node.light = light;
        }
        Ok(())
    }

    /// Attach a model. A different model discards the cached bounding volume.
    pub fn set_model(&mut self, key: NodeKey, model: Option<Rc<Model>>) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(key).ok_or(SceneError::InvalidNode(key))?;
        if !same_component(&node.model, &model) {
            node.model = model;
            node.bounds.set(None);
        }
        Ok(())
    }

    pub fn set_particle_emitter(
        &mut self,
        key: NodeKey,
        emitter: Option<Rc<ParticleEmitter>>,
    ) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(key).ok_or(SceneError::InvalidNode(key))?;
        if !same_component(&node.particle_emitter, &emitter) {
            node.particle_emitter = emitter;
        }
        Ok(())
    }

    /// Attach an audio source. The source's node back-reference follows,
    /// and its position is synced to the node's world translation right away.
    pub fn set_audio_source(
        &mut self,
        key: NodeKey,
        source: Option<Rc<AudioSource>>,
    ) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(key).ok_or(SceneError::InvalidNode(key))?;
        if same_component(&node.audio_source, &source) {
            return Ok(());
        }
        let previous = std::mem::replace(&mut node.audio_source, source.clone());
        if let Some(old) = previous {
            if old.node() == Some(key) {
                old.set_node(None);
            }
        }
        if let Some(new) = source {
            if let Some(other) = new.node().filter(|&k| k != key) {
                debug!("Audio source moved from {:?} to {:?}", other, key);
            }
            new.set_node(Some(key));
            new.transform_changed(self, key);
        }
        Ok(())
    }

    // --- Scenes ---

    pub fn create_scene(&mut self, id: impl Into<String>) -> SceneKey {
        let key = self.scenes.insert(Scene::new(id));
        debug!("Created scene {:?}", key);
        key
    }

    pub fn scene(&self, key: SceneKey) -> Option<&Scene> {
        self.scenes.get(key)
    }

    pub fn scene_mut(&mut self, key: SceneKey) -> Option<&mut Scene> {
        self.scenes.get_mut(key)
    }

    pub fn scenes(&self) -> impl Iterator<Item = (SceneKey, &Scene)> {
        self.scenes.iter()
    }

    /// Remove a scene. Its root nodes survive, detached from any scene.
    pub fn destroy_scene(&mut self, key: SceneKey) -> Result<(), SceneError> {
        let scene = self.scenes.remove(key).ok_or(SceneError::InvalidScene(key))?;
        for root in scene.roots {
            self.set_subtree_scene(root, None);
        }
        Ok(())
    }

    /// Make a parentless node a root of `scene`. A node with a parent is
    /// detached from it first.
    pub fn add_to_scene(&mut self, scene: SceneKey, node: NodeKey) -> Result<(), SceneError> {
        self.check_scene(scene)?;
        self.check_node(node)?;

        if let Some(parent) = self.nodes[node].parent {
            self.detach_child(parent, node);
        } else if let Some(old) = self.nodes[node].scene {
            if old == scene {
                return Ok(());
            }
            self.remove_scene_root(old, node);
        }

        let target = &mut self.scenes[scene];
        target.roots.push(node);
        target.hierarchy_revision += 1;
        self.set_subtree_scene(node, Some(scene));
        debug!("Added {:?} to scene {:?}", node, scene);
        Ok(())
    }

    pub fn remove_from_scene(&mut self, scene: SceneKey, node: NodeKey) -> Result<(), SceneError> {
        self.check_scene(scene)?;
        self.check_node(node)?;
        if !self.scenes[scene].contains_root(node) {
            return Err(SceneError::NotInScene { scene, node });
        }
        self.remove_scene_root(scene, node);
        self.set_subtree_scene(node, None);
        Ok(())
    }

    /// Select the node whose camera drives view-dependent matrices in `scene`
    pub fn set_active_camera(&mut self, scene: SceneKey, camera: Option<NodeKey>) -> Result<(), SceneError> {
        self.check_scene(scene)?;
        if let Some(key) = camera {
            self.check_node(key)?;
            if self.nodes[key].camera.is_none() {
                warn!("Active camera node {:?} has no camera attached", key);
            }
        }
        self.scenes[scene].active_camera = camera;
        Ok(())
    }

    /// Find a node in a scene by id. Without `recursive` only root nodes are
    /// checked.
    pub fn find_in_scene(&self, scene: SceneKey, id: &str, recursive: bool, exact: bool) -> Option<NodeRef<'_>> {
        let scene = self.scenes.get(scene)?;
        scene.roots.iter().filter_map(|&k| self.node(k)).find_map(|root| {
            if recursive {
                root.find_node(id, true, exact)
            } else {
                id_matches(root.id(), id, exact).then_some(root)
            }
        })
    }

    // --- Statistics ---

    pub fn cache_stats(&self) -> CacheStats {
        self.stats.get()
    }

    pub fn reset_cache_stats(&self) {
        self.stats.set(CacheStats::default());
    }

    pub(crate) fn record_world_recompute(&self) {
        let mut stats = self.stats.get();
        stats.world_matrices += 1;
        self.stats.set(stats);
    }

    pub(crate) fn record_camera_recompute(&self) {
        let mut stats = self.stats.get();
        stats.camera_matrices += 1;
        self.stats.set(stats);
    }

    pub(crate) fn record_bounds_recompute(&self) {
        let mut stats = self.stats.get();
        stats.bounds += 1;
        self.stats.set(stats);
    }
}

fn same_component<T: ?Sized>(current: &Option<Rc<T>>, new: &Option<Rc<T>>) -> bool {
    match (current, new) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Mutable borrow of a node's transform. Dropping it after a mutation
/// invalidates the subtree and notifies listeners exactly once.
pub struct TransformMut<'w> {
    world: &'w mut World,
    key: NodeKey,
    changed: bool,
}

impl Deref for TransformMut<'_> {
    type Target = Transform;

    fn deref(&self) -> &Transform {
        &self.world.nodes[self.key].transform
    }
}

impl DerefMut for TransformMut<'_> {
    fn deref_mut(&mut self) -> &mut Transform {
        self.changed = true;
        &mut self.world.nodes[self.key].transform
    }
}

impl Drop for TransformMut<'_> {
    fn drop(&mut self) {
        if !self.changed {
            return;
        }
        let world: &World = self.world;
        world.transform_changed(self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_new() {
        let world = World::new();
        assert!(world.is_empty());
        assert_eq!(world.node_count(), 0);
    }

    #[test]
    fn test_create_node_is_detached() {
        let mut world = World::new();
        let key = world.create_node("a");
        let node = world.node(key).unwrap();
        assert_eq!(node.id(), "a");
        assert!(node.parent().is_none());
        assert!(node.scene().is_none());
        assert_eq!(node.kind(), NodeKind::Node);
    }

    #[test]
    fn test_create_node_without_id() {
        let mut world = World::new();
        let key = world.create_node(None);
        assert_eq!(world.node(key).unwrap().id(), "");
    }

    #[test]
    fn test_create_joint() {
        let mut world = World::new();
        let key = world.create_joint("hip");
        assert_eq!(world.node(key).unwrap().kind(), NodeKind::Joint);
    }

    #[test]
    fn test_default_bounds_type() {
        let mut world = World::new().with_default_bounds_type(BoundsType::Sphere);
        let key = world.create_node("a");
        assert_eq!(world.node(key).unwrap().bounds_type(), BoundsType::Sphere);
    }

    #[test]
    fn test_add_child_rejects_self() {
        let mut world = World::new();
        let a = world.create_node("a");
        assert_eq!(
            world.add_child(a, a),
            Err(SceneError::CycleDetected { parent: a, child: a })
        );
    }

    #[test]
    fn test_add_child_rejects_cycle() {
        let mut world = World::new();
        let a = world.create_node("a");
        let b = world.create_node("b");
        let c = world.create_node("c");
        world.add_child(a, b).unwrap();
        world.add_child(b, c).unwrap();

        assert!(matches!(world.add_child(c, a), Err(SceneError::CycleDetected { .. })));
        assert_eq!(world.node(a).unwrap().parent_key(), None);
    }

    #[test]
    fn test_add_child_twice_is_noop() {
        let mut world = World::new();
        let a = world.create_node("a");
        let b = world.create_node("b");
        world.add_child(a, b).unwrap();
        world.add_child(a, b).unwrap();
        assert_eq!(world.node(a).unwrap().child_keys(), &[b]);
    }

    #[test]
    fn test_remove_child_not_a_child() {
        let mut world = World::new();
        let a = world.create_node("a");
        let b = world.create_node("b");
        assert_eq!(
            world.remove_child(a, b),
            Err(SceneError::NotAChild { parent: a, child: b })
        );
    }

    #[test]
    fn test_stale_key_is_invalid() {
        let mut world = World::new();
        let a = world.create_node("a");
        world.destroy_node(a).unwrap();
        assert!(world.node(a).is_none());
        assert!(world.transform_mut(a).is_none());
        assert_eq!(world.translate(a, Vec3::X), Err(SceneError::InvalidNode(a)));
    }

    #[test]
    fn test_destroy_removes_subtree() {
        let mut world = World::new();
        let a = world.create_node("a");
        let b = world.create_node("b");
        let c = world.create_node("c");
        let d = world.create_node("d");
        world.add_child(a, b).unwrap();
        world.add_child(b, c).unwrap();
        world.add_child(a, d).unwrap();

        assert_eq!(world.destroy_node(b).unwrap(), 2);
        assert!(!world.contains(b));
        assert!(!world.contains(c));
        assert_eq!(world.node(a).unwrap().child_keys(), &[d]);
    }

    #[test]
    fn test_subtree_is_preorder() {
        let mut world = World::new();
        let a = world.create_node("a");
        let b = world.create_node("b");
        let c = world.create_node("c");
        let d = world.create_node("d");
        world.add_child(a, b).unwrap();
        world.add_child(b, c).unwrap();
        world.add_child(a, d).unwrap();
        assert_eq!(world.subtree(a), vec![a, b, c, d]);
    }

    #[test]
    fn test_unchanged_guard_does_not_invalidate() {
        let mut world = World::new();
        let a = world.create_node("a");
        world.node(a).unwrap().world_matrix();
        {
            let guard = world.transform_mut(a).unwrap();
            let _ = guard.translation;
        }
        assert!(!world.node(a).unwrap().is_dirty(DirtyBits::WORLD));
    }

    #[test]
    fn test_guard_invalidates_on_drop() {
        let mut world = World::new();
        let a = world.create_node("a");
        world.node(a).unwrap().world_matrix();
        world.transform_mut(a).unwrap().translation = Vec3::X;
        assert!(world.node(a).unwrap().is_dirty(DirtyBits::WORLD));
    }

    #[test]
    fn test_scene_membership_propagates() {
        let mut world = World::new();
        let scene = world.create_scene("level");
        let root = world.create_node("root");
        let child = world.create_node("child");
        world.add_child(root, child).unwrap();
        world.add_to_scene(scene, root).unwrap();

        assert_eq!(world.node(child).unwrap().scene(), Some(scene));
        assert_eq!(world.scene(scene).unwrap().roots(), &[root]);

        world.remove_from_scene(scene, root).unwrap();
        assert_eq!(world.node(child).unwrap().scene(), None);
    }

    #[test]
    fn test_remove_from_scene_requires_root() {
        let mut world = World::new();
        let scene = world.create_scene("level");
        let a = world.create_node("a");
        assert_eq!(
            world.remove_from_scene(scene, a),
            Err(SceneError::NotInScene { scene, node: a })
        );
    }

    #[test]
    fn test_cache_stats_reset() {
        let mut world = World::new();
        let a = world.create_node("a");
        world.node(a).unwrap().world_matrix();
        assert_eq!(world.cache_stats().world_matrices, 1);
        world.reset_cache_stats();
        assert_eq!(world.cache_stats(), CacheStats::default());
    }
}

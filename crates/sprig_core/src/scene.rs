//! Scenes: named sets of root nodes with an active camera

use crate::world::NodeKey;

/// A scene owns a list of root nodes and selects the camera used for the
/// view-dependent matrices of every node under those roots.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    id: String,
    pub(crate) roots: Vec<NodeKey>,
    pub(crate) active_camera: Option<NodeKey>,
    pub(crate) hierarchy_revision: u64,
}

impl Scene {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Root nodes in insertion order
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    pub fn contains_root(&self, node: NodeKey) -> bool {
        self.roots.contains(&node)
    }

    pub fn active_camera(&self) -> Option<NodeKey> {
        self.active_camera
    }

    /// Bumped whenever the hierarchy under this scene changes shape
    pub fn hierarchy_revision(&self) -> u64 {
        self.hierarchy_revision
    }

    pub(crate) fn remove_root(&mut self, node: NodeKey) -> bool {
        match self.roots.iter().position(|&k| k == node) {
            Some(index) => {
                self.roots.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_new_scene_is_empty() {
        let scene = Scene::new("level");
        assert_eq!(scene.id(), "level");
        assert!(scene.roots().is_empty());
        assert!(scene.active_camera().is_none());
        assert_eq!(scene.hierarchy_revision(), 0);
    }

    #[test]
    fn test_remove_root() {
        let mut keys: SlotMap<NodeKey, ()> = SlotMap::with_key();
        let a = keys.insert(());
        let b = keys.insert(());
        let mut scene = Scene::new("level");
        scene.roots.extend([a, b]);

        assert!(scene.remove_root(a));
        assert!(!scene.remove_root(a));
        assert_eq!(scene.roots(), &[b]);
    }
}

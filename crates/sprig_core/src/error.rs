//! Scene graph error types
//!
//! Structural misuse of the hierarchy (unknown keys, cycles) is reported
//! through [`SceneError`]. Lookups that simply find nothing return `None`
//! instead.

use std::fmt;

use crate::world::{NodeKey, SceneKey};

/// Error type for hierarchy and scene operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The node key does not refer to a live node
    InvalidNode(NodeKey),
    /// The scene key does not refer to a live scene
    InvalidScene(SceneKey),
    /// Attaching `child` under `parent` would make a node its own ancestor
    CycleDetected {
        parent: NodeKey,
        child: NodeKey,
    },
    /// `child` is not a direct child of `parent`
    NotAChild {
        parent: NodeKey,
        child: NodeKey,
    },
    /// `node` is not a root of `scene`
    NotInScene {
        scene: SceneKey,
        node: NodeKey,
    },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::InvalidNode(key) => write!(f, "Invalid node: {:?}", key),
            SceneError::InvalidScene(key) => write!(f, "Invalid scene: {:?}", key),
            SceneError::CycleDetected { parent, child } => write!(
                f,
                "Cannot attach {:?} under {:?}: it would become its own ancestor",
                child, parent
            ),
            SceneError::NotAChild { parent, child } => {
                write!(f, "{:?} is not a child of {:?}", child, parent)
            }
            SceneError::NotInScene { scene, node } => {
                write!(f, "{:?} is not a root of scene {:?}", node, scene)
            }
        }
    }
}

impl std::error::Error for SceneError {}

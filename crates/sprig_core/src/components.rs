//! Shareable components that can be attached to a node
//!
//! Components are held by nodes through `Rc`, so one camera or model may be
//! attached to several nodes at once. Attaching never copies the component.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use sprig_math::{mat4, BoundingBox, BoundingSphere, Mat4, Vec3};

static NEXT_CAMERA_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Camera projection parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        width: f32,
        height: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective { fov_y, aspect, near, far } => {
                mat4::perspective(fov_y, aspect, near, far)
            }
            Projection::Orthographic { width, height, near, far } => {
                mat4::orthographic(width, height, near, far)
            }
        }
    }
}

/// A camera. Its view comes from the node it is attached to; the camera
/// itself only carries the projection.
#[derive(Debug)]
pub struct Camera {
    serial: u64,
    projection: Cell<Projection>,
    revision: Cell<u64>,
}

impl Camera {
    pub fn new(projection: Projection) -> Self {
        Self {
            serial: NEXT_CAMERA_SERIAL.fetch_add(1, Ordering::Relaxed),
            projection: Cell::new(projection),
            revision: Cell::new(0),
        }
    }

    /// Perspective camera; `fov_y` in radians
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::new(Projection::Perspective { fov_y, aspect, near, far })
    }

    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Self {
        Self::new(Projection::Orthographic { width, height, near, far })
    }

    pub fn projection(&self) -> Projection {
        self.projection.get()
    }

    /// Replace the projection. Nodes viewed through this camera pick up the
    /// change on their next matrix query.
    pub fn set_projection(&self, projection: Projection) {
        self.projection.set(projection);
        self.revision.set(self.revision.get() + 1);
    }

    /// Update the aspect ratio (perspective) or width (orthographic, keeping height)
    pub fn set_aspect_ratio(&self, aspect: f32) {
        let updated = match self.projection.get() {
            Projection::Perspective { fov_y, near, far, .. } => {
                Projection::Perspective { fov_y, aspect, near, far }
            }
            Projection::Orthographic { height, near, far, .. } => {
                Projection::Orthographic { width: height * aspect, height, near, far }
            }
        };
        self.set_projection(updated);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.get().matrix()
    }

    /// Process-unique identity of this camera
    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }

    /// Bumped on every projection change
    pub(crate) fn revision(&self) -> u64 {
        self.revision.get()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    Directional,
    Point { range: f32 },
    Spot { range: f32, inner_angle: f32, outer_angle: f32 },
}

/// A light source
#[derive(Debug)]
pub struct Light {
    kind: LightKind,
    color: Cell<Vec3>,
}

impl Light {
    pub fn new(kind: LightKind, color: Vec3) -> Self {
        Self { kind, color: Cell::new(color) }
    }

    pub fn directional(color: Vec3) -> Self {
        Self::new(LightKind::Directional, color)
    }

    pub fn point(color: Vec3, range: f32) -> Self {
        Self::new(LightKind::Point { range }, color)
    }

    pub fn kind(&self) -> LightKind {
        self.kind
    }

    pub fn color(&self) -> Vec3 {
        self.color.get()
    }

    pub fn set_color(&self, color: Vec3) {
        self.color.set(color);
    }
}

/// Renderable geometry reference with a local-space bounding box
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    bounds: BoundingBox,
}

impl Model {
    pub fn new(name: impl Into<String>, bounds: BoundingBox) -> Self {
        Self { name: name.into(), bounds }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local-space bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }

    /// Local-space bounding sphere enclosing the box
    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::from_box(&self.bounds)
    }
}

/// A particle emitter handle
#[derive(Debug)]
pub struct ParticleEmitter {
    name: String,
    emission_rate: Cell<f32>,
    started: Cell<bool>,
}

impl ParticleEmitter {
    pub fn new(name: impl Into<String>, emission_rate: f32) -> Self {
        Self {
            name: name.into(),
            emission_rate: Cell::new(emission_rate),
            started: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn emission_rate(&self) -> f32 {
        self.emission_rate.get()
    }

    pub fn set_emission_rate(&self, rate: f32) {
        self.emission_rate.set(rate.max(0.0));
    }

    pub fn start(&self) {
        self.started.set(true);
    }

    pub fn stop(&self) {
        self.started.set(false);
    }

    pub fn is_started(&self) -> bool {
        self.started.get()
    }
}

//! Positional audio sources
//!
//! An [`AudioSource`] owns a device voice and the buffer it plays. Attached
//! to a node, it follows that node: every world-placement change pushes the
//! node's world translation to the device.

use std::cell::Cell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::trace;
use sprig_math::Vec3;

use super::controller::AudioController;
use super::device::{AudioDevice, AudioState, BufferHandle, SourceHandle};
use super::error::AudioError;
use super::format::SoundFormat;
use crate::transform::TransformListener;
use crate::world::{NodeKey, World};

/// Loaded sample data. Released from the device on drop.
pub struct AudioBuffer {
    device: Rc<dyn AudioDevice>,
    handle: BufferHandle,
    path: PathBuf,
    format: SoundFormat,
}

impl AudioBuffer {
    /// Load `path`, choosing the format from its extension
    pub fn load(device: Rc<dyn AudioDevice>, path: &Path) -> Result<Self, AudioError> {
        let format = SoundFormat::from_path(path)?;
        let handle = device.load_buffer(path, format)?;
        Ok(Self {
            device,
            handle,
            path: path.to_path_buf(),
            format,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SoundFormat {
        self.format
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }
}

impl Drop for AudioBuffer {
    fn drop(&mut self) {
        self.device.release_buffer(self.handle);
    }
}

impl fmt::Debug for AudioBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBuffer")
            .field("handle", &self.handle)
            .field("path", &self.path)
            .field("format", &self.format)
            .finish()
    }
}

/// A playable, positionable sound
pub struct AudioSource {
    device: Rc<dyn AudioDevice>,
    handle: SourceHandle,
    buffer: AudioBuffer,
    looped: Cell<bool>,
    gain: Cell<f32>,
    pitch: Cell<f32>,
    velocity: Cell<Vec3>,
    node: Cell<Option<NodeKey>>,
}

impl AudioSource {
    /// Create a source for the sound file at `path`.
    ///
    /// Returns `None` if the file cannot be loaded, the device has no voice
    /// left, or a live source for the same path already exists.
    pub fn create(controller: &AudioController, path: impl AsRef<Path>) -> Option<Rc<AudioSource>> {
        controller.create_source(path.as_ref())
    }

    pub(crate) fn new(buffer: AudioBuffer, gain: f32) -> Result<Self, AudioError> {
        let device = Rc::clone(&buffer.device);
        let handle = device.create_source(buffer.handle)?;
        device.set_gain(handle, gain);
        device.set_pitch(handle, 1.0);
        device.set_looping(handle, false);
        Ok(Self {
            device,
            handle,
            buffer,
            looped: Cell::new(false),
            gain: Cell::new(gain),
            pitch: Cell::new(1.0),
            velocity: Cell::new(Vec3::ZERO),
            node: Cell::new(None),
        })
    }

    /// Start playback; a paused source continues from where it paused.
    /// Playing an already playing source does nothing.
    pub fn play(&self) {
        match self.state() {
            AudioState::Playing => {}
            state => {
                trace!("Playing {} from {:?}", self.buffer.path.display(), state);
                self.device.play(self.handle);
            }
        }
    }

    pub fn pause(&self) {
        if self.state() == AudioState::Playing {
            self.device.pause(self.handle);
        }
    }

    /// Continue a paused source; no effect in any other state
    pub fn resume(&self) {
        if self.state() == AudioState::Paused {
            self.play();
        }
    }

    /// Stop and reset the play position
    pub fn stop(&self) {
        self.device.stop(self.handle);
    }

    /// Reset the play position without changing state
    pub fn rewind(&self) {
        self.device.rewind(self.handle);
    }

    /// Playback state as reported by the device
    pub fn state(&self) -> AudioState {
        self.device.state(self.handle)
    }

    pub fn is_looped(&self) -> bool {
        self.looped.get()
    }

    pub fn set_looped(&self, looped: bool) {
        self.looped.set(looped);
        self.device.set_looping(self.handle, looped);
    }

    pub fn gain(&self) -> f32 {
        self.gain.get()
    }

    pub fn set_gain(&self, gain: f32) {
        self.gain.set(gain);
        self.device.set_gain(self.handle, gain);
    }

    pub fn pitch(&self) -> f32 {
        self.pitch.get()
    }

    pub fn set_pitch(&self, pitch: f32) {
        self.pitch.set(pitch);
        self.device.set_pitch(self.handle, pitch);
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity.get()
    }

    pub fn set_velocity(&self, velocity: Vec3) {
        self.velocity.set(velocity);
        self.device.set_velocity(self.handle, velocity);
    }

    /// The node this source is attached to
    pub fn node(&self) -> Option<NodeKey> {
        self.node.get()
    }

    pub(crate) fn set_node(&self, node: Option<NodeKey>) {
        self.node.set(node);
    }

    pub fn path(&self) -> &Path {
        self.buffer.path()
    }

    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }

    /// Device handle of this source's voice
    pub fn handle(&self) -> SourceHandle {
        self.handle
    }
}

impl TransformListener for AudioSource {
    fn transform_changed(&self, world: &World, node: NodeKey) {
        let target = self.node.get().unwrap_or(node);
        if let Some(node) = world.node(target) {
            self.device.set_position(self.handle, node.world_translation());
        }
    }
}

impl Drop for AudioSource {
    fn drop(&mut self) {
        self.device.stop(self.handle);
        self.device.release_source(self.handle);
    }
}

impl fmt::Debug for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioSource")
            .field("handle", &self.handle)
            .field("path", &self.buffer.path)
            .field("node", &self.node.get())
            .finish()
    }
}

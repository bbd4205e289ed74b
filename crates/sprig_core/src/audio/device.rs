//! The audio backend seam
//!
//! [`AudioDevice`] is what an [`AudioSource`](super::AudioSource) talks to.
//! Handles are opaque to everything above the device.

use std::path::Path;

use sprig_math::Vec3;

use super::error::AudioError;
use super::format::SoundFormat;

/// Device-side handle to loaded sample data
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Device-side handle to a playing voice
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceHandle(pub u64);

/// Playback state of a source as reported by the device
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AudioState {
    /// Created, never played
    #[default]
    Initial,
    Playing,
    Paused,
    Stopped,
}

/// A playback backend.
///
/// Methods take `&self`; implementations keep their bookkeeping behind
/// interior mutability since sources share one device.
pub trait AudioDevice {
    /// Load and decode the file at `path`
    fn load_buffer(&self, path: &Path, format: SoundFormat) -> Result<BufferHandle, AudioError>;
    fn release_buffer(&self, buffer: BufferHandle);

    /// Create a voice that plays `buffer`
    fn create_source(&self, buffer: BufferHandle) -> Result<SourceHandle, AudioError>;
    fn release_source(&self, source: SourceHandle);

    /// Start playback, or continue from the paused position
    fn play(&self, source: SourceHandle);
    fn pause(&self, source: SourceHandle);
    fn stop(&self, source: SourceHandle);
    /// Move the play cursor back to the start without changing state
    fn rewind(&self, source: SourceHandle);

    /// Unknown handles report [`AudioState::Initial`]
    fn state(&self, source: SourceHandle) -> AudioState;

    fn set_looping(&self, source: SourceHandle, looping: bool);
    fn set_gain(&self, source: SourceHandle, gain: f32);
    fn set_pitch(&self, source: SourceHandle, pitch: f32);
    fn set_position(&self, source: SourceHandle, position: Vec3);
    fn set_velocity(&self, source: SourceHandle, velocity: Vec3);
}

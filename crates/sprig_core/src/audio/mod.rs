//! Positional audio attached to scene nodes
//!
//! - [`AudioDevice`] - backend seam; [`HeadlessDevice`] simulates playback
//! - [`AudioController`] - owns the device, one live source per sound file
//! - [`AudioSource`] - a playable sound that follows the node it is attached to

mod controller;
mod device;
mod error;
mod format;
mod headless;
mod source;

pub use controller::AudioController;
pub use device::{AudioDevice, AudioState, BufferHandle, SourceHandle};
pub use error::AudioError;
pub use format::{probe, PcmFormat, SoundFormat, SoundInfo};
pub use headless::{HeadlessDevice, VoiceSnapshot};
pub use source::{AudioBuffer, AudioSource};

//! Audio controller: owns the device and tracks live sources
//!
//! Sources are keyed by the path they were created from. At most one live
//! source exists per path; entries for dropped sources are pruned lazily.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use log::{debug, error, warn};

use super::device::{AudioDevice, AudioState};
use super::error::AudioError;
use super::source::{AudioBuffer, AudioSource};

/// Owner of the audio device and registry of live sources
pub struct AudioController {
    device: Rc<dyn AudioDevice>,
    default_gain: f32,
    sources: RefCell<HashMap<PathBuf, Weak<AudioSource>>>,
    /// Sources paused by [`pause_all`](Self::pause_all)
    suspended: RefCell<Vec<Weak<AudioSource>>>,
}

impl AudioController {
    pub fn new(device: Rc<dyn AudioDevice>) -> Self {
        Self {
            device,
            default_gain: 1.0,
            sources: RefCell::new(HashMap::new()),
            suspended: RefCell::new(Vec::new()),
        }
    }

    /// Gain given to newly created sources
    pub fn with_default_gain(mut self, gain: f32) -> Self {
        self.default_gain = gain;
        self
    }

    pub fn device(&self) -> &Rc<dyn AudioDevice> {
        &self.device
    }

    /// Create a source for `path`, or `None` if one is already live for the
    /// same path or loading fails.
    pub fn create_source(&self, path: &Path) -> Option<Rc<AudioSource>> {
        let mut sources = self.sources.borrow_mut();
        sources.retain(|_, source| source.strong_count() > 0);

        if sources.contains_key(path) {
            warn!("Audio source for '{}' already exists", path.display());
            return None;
        }

        match self.load(path) {
            Ok(source) => {
                let source = Rc::new(source);
                sources.insert(path.to_path_buf(), Rc::downgrade(&source));
                debug!("Created audio source for '{}'", path.display());
                Some(source)
            }
            Err(e) => {
                error!("Failed to create audio source for '{}': {}", path.display(), e);
                None
            }
        }
    }

    fn load(&self, path: &Path) -> Result<AudioSource, AudioError> {
        let buffer = AudioBuffer::load(Rc::clone(&self.device), path)?;
        AudioSource::new(buffer, self.default_gain)
    }

    /// The live source created for `path`, if any
    pub fn source(&self, path: impl AsRef<Path>) -> Option<Rc<AudioSource>> {
        self.sources.borrow().get(path.as_ref()).and_then(Weak::upgrade)
    }

    pub fn live_source_count(&self) -> usize {
        self.sources
            .borrow()
            .values()
            .filter(|source| source.strong_count() > 0)
            .count()
    }

    /// Pause every playing source, remembering which ones to resume
    pub fn pause_all(&self) {
        let mut suspended = self.suspended.borrow_mut();
        for source in self.sources.borrow().values().filter_map(Weak::upgrade) {
            if source.state() == AudioState::Playing {
                source.pause();
                suspended.push(Rc::downgrade(&source));
            }
        }
        debug!("Paused {} audio source(s)", suspended.len());
    }

    /// Resume the sources paused by [`pause_all`](Self::pause_all)
    pub fn resume_all(&self) {
        let suspended = std::mem::take(&mut *self.suspended.borrow_mut());
        for source in suspended.iter().filter_map(Weak::upgrade) {
            source.resume();
        }
    }
}

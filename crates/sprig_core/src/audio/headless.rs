//! A device that simulates playback without producing sound
//!
//! Durations come from the file headers; time only moves when
//! [`HeadlessDevice::advance`] is called. Used by the demo binary and tests,
//! and anywhere a real output device is unavailable.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use log::debug;
use slotmap::{Key, KeyData, SlotMap};
use sprig_math::Vec3;

use super::device::{AudioDevice, AudioState, BufferHandle, SourceHandle};
use super::error::AudioError;
use super::format::{self, PcmFormat, SoundFormat};

slotmap::new_key_type! {
    struct BufferKey;
    struct VoiceKey;
}

#[derive(Debug)]
struct SimBuffer {
    path: PathBuf,
    duration: f32,
}

/// Everything the device knows about one voice
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceSnapshot {
    pub state: AudioState,
    /// Seconds into the buffer
    pub cursor: f32,
    pub duration: f32,
    pub looping: bool,
    pub gain: f32,
    pub pitch: f32,
    pub position: Vec3,
    pub velocity: Vec3,
    /// How many times the position has been pushed
    pub position_updates: u32,
}

#[derive(Debug)]
struct Voice {
    buffer: BufferKey,
    snapshot: VoiceSnapshot,
}

/// Simulated audio output
#[derive(Debug)]
pub struct HeadlessDevice {
    raw_format: PcmFormat,
    max_sources: usize,
    buffers: RefCell<SlotMap<BufferKey, SimBuffer>>,
    voices: RefCell<SlotMap<VoiceKey, Voice>>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new(PcmFormat::default())
    }
}

fn buffer_key(handle: BufferHandle) -> BufferKey {
    KeyData::from_ffi(handle.0).into()
}

fn voice_key(handle: SourceHandle) -> VoiceKey {
    KeyData::from_ffi(handle.0).into()
}

impl HeadlessDevice {
    /// `raw_format` is the layout assumed for headerless files
    pub fn new(raw_format: PcmFormat) -> Self {
        Self {
            raw_format,
            max_sources: usize::MAX,
            buffers: RefCell::new(SlotMap::with_key()),
            voices: RefCell::new(SlotMap::with_key()),
        }
    }

    /// Limit the number of simultaneously existing voices
    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources;
        self
    }

    /// Move simulated time forward. Playing voices advance by
    /// `seconds * pitch`; a voice that reaches the end wraps when looping and
    /// stops otherwise.
    pub fn advance(&self, seconds: f32) {
        for voice in self.voices.borrow_mut().values_mut() {
            let v = &mut voice.snapshot;
            if v.state != AudioState::Playing {
                continue;
            }
            v.cursor += seconds * v.pitch;
            if v.cursor < v.duration {
                continue;
            }
            if v.looping && v.duration > 0.0 {
                v.cursor %= v.duration;
            } else {
                v.state = AudioState::Stopped;
                v.cursor = 0.0;
            }
        }
    }

    pub fn voice(&self, source: SourceHandle) -> Option<VoiceSnapshot> {
        self.voices.borrow().get(voice_key(source)).map(|v| v.snapshot)
    }

    /// Path a buffer was loaded from
    pub fn buffer_path(&self, buffer: BufferHandle) -> Option<PathBuf> {
        self.buffers.borrow().get(buffer_key(buffer)).map(|b| b.path.clone())
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.borrow().len()
    }

    pub fn source_count(&self) -> usize {
        self.voices.borrow().len()
    }

    fn with_voice(&self, source: SourceHandle, f: impl FnOnce(&mut VoiceSnapshot)) {
        if let Some(voice) = self.voices.borrow_mut().get_mut(voice_key(source)) {
            f(&mut voice.snapshot);
        }
    }
}

impl AudioDevice for HeadlessDevice {
    fn load_buffer(&self, path: &Path, format: SoundFormat) -> Result<BufferHandle, AudioError> {
        let bytes = std::fs::read(path)?;
        let info = format::probe(&bytes, format, self.raw_format)?;
        let key = self.buffers.borrow_mut().insert(SimBuffer {
            path: path.to_path_buf(),
            duration: info.duration(),
        });
        debug!("Loaded {} ({:.2}s, {:?})", path.display(), info.duration(), info.pcm);
        Ok(BufferHandle(key.data().as_ffi()))
    }

    fn release_buffer(&self, buffer: BufferHandle) {
        self.buffers.borrow_mut().remove(buffer_key(buffer));
    }

    fn create_source(&self, buffer: BufferHandle) -> Result<SourceHandle, AudioError> {
        let duration = self
            .buffers
            .borrow()
            .get(buffer_key(buffer))
            .map(|b| b.duration)
            .ok_or_else(|| AudioError::Device(format!("unknown buffer {:?}", buffer)))?;

        let mut voices = self.voices.borrow_mut();
        if voices.len() >= self.max_sources {
            return Err(AudioError::Device(format!(
                "out of voices ({} in use)",
                voices.len()
            )));
        }
        let key = voices.insert(Voice {
            buffer: buffer_key(buffer),
            snapshot: VoiceSnapshot {
                state: AudioState::Initial,
                cursor: 0.0,
                duration,
                looping: false,
                gain: 1.0,
                pitch: 1.0,
                position: Vec3::ZERO,
                velocity: Vec3::ZERO,
                position_updates: 0,
            },
        });
        Ok(SourceHandle(key.data().as_ffi()))
    }

    fn release_source(&self, source: SourceHandle) {
        if let Some(voice) = self.voices.borrow_mut().remove(voice_key(source)) {
            debug!("Released voice {:?} (buffer {:?})", source, voice.buffer);
        }
    }

    fn play(&self, source: SourceHandle) {
        self.with_voice(source, |v| v.state = AudioState::Playing);
    }

    fn pause(&self, source: SourceHandle) {
        self.with_voice(source, |v| {
            if v.state == AudioState::Playing {
                v.state = AudioState::Paused;
            }
        });
    }

    fn stop(&self, source: SourceHandle) {
        self.with_voice(source, |v| {
            v.state = AudioState::Stopped;
            v.cursor = 0.0;
        });
    }

    fn rewind(&self, source: SourceHandle) {
        self.with_voice(source, |v| v.cursor = 0.0);
    }

    fn state(&self, source: SourceHandle) -> AudioState {
        self.voice(source).map_or(AudioState::Initial, |v| v.state)
    }

    fn set_looping(&self, source: SourceHandle, looping: bool) {
        self.with_voice(source, |v| v.looping = looping);
    }

    fn set_gain(&self, source: SourceHandle, gain: f32) {
        self.with_voice(source, |v| v.gain = gain);
    }

    fn set_pitch(&self, source: SourceHandle, pitch: f32) {
        self.with_voice(source, |v| v.pitch = pitch);
    }

    fn set_position(&self, source: SourceHandle, position: Vec3) {
        self.with_voice(source, |v| {
            v.position = position;
            v.position_updates += 1;
        });
    }

    fn set_velocity(&self, source: SourceHandle, velocity: Vec3) {
        self.with_voice(source, |v| v.velocity = velocity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::format::tests::{cleanup_temp_file, write_temp_wav};

    /// One second of 8 kHz mono 8-bit silence
    fn one_second_wav(name: &str) -> PathBuf {
        write_temp_wav(name, PcmFormat { sample_rate: 8000, channels: 1, bits_per_sample: 8 }, 8000)
    }

    fn playing_voice(device: &HeadlessDevice, path: &Path) -> SourceHandle {
        let buffer = device.load_buffer(path, SoundFormat::Wav).unwrap();
        let source = device.create_source(buffer).unwrap();
        device.play(source);
        source
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let device = HeadlessDevice::default();
        let err = device.load_buffer(Path::new("/nonexistent/sound.wav"), SoundFormat::Wav);
        assert!(matches!(err, Err(AudioError::Io(_))));
        assert_eq!(device.buffer_count(), 0);
    }

    #[test]
    fn test_playback_runs_to_completion() {
        let path = one_second_wav("headless_complete.wav");
        let device = HeadlessDevice::default();
        let source = playing_voice(&device, &path);

        device.advance(0.5);
        assert_eq!(device.state(source), AudioState::Playing);
        device.advance(0.6);
        assert_eq!(device.state(source), AudioState::Stopped);

        cleanup_temp_file(&path);
    }

    #[test]
    fn test_looping_wraps() {
        let path = one_second_wav("headless_loop.wav");
        let device = HeadlessDevice::default();
        let source = playing_voice(&device, &path);
        device.set_looping(source, true);

        device.advance(1.25);
        let voice = device.voice(source).unwrap();
        assert_eq!(voice.state, AudioState::Playing);
        assert!((voice.cursor - 0.25).abs() < 1e-5);

        cleanup_temp_file(&path);
    }

    #[test]
    fn test_pause_keeps_cursor() {
        let path = one_second_wav("headless_pause.wav");
        let device = HeadlessDevice::default();
        let source = playing_voice(&device, &path);

        device.advance(0.4);
        device.pause(source);
        device.advance(10.0);
        let voice = device.voice(source).unwrap();
        assert_eq!(voice.state, AudioState::Paused);
        assert!((voice.cursor - 0.4).abs() < 1e-5);

        cleanup_temp_file(&path);
    }

    #[test]
    fn test_max_sources() {
        let path = one_second_wav("headless_max.wav");
        let device = HeadlessDevice::default().with_max_sources(1);
        let buffer = device.load_buffer(&path, SoundFormat::Wav).unwrap();
        let first = device.create_source(buffer).unwrap();
        assert!(matches!(device.create_source(buffer), Err(AudioError::Device(_))));

        device.release_source(first);
        assert!(device.create_source(buffer).is_ok());
        assert_eq!(device.buffer_path(buffer), Some(path.clone()));

        cleanup_temp_file(&path);
    }

    #[test]
    fn test_unknown_source_reports_initial() {
        let device = HeadlessDevice::default();
        assert_eq!(device.state(SourceHandle(12345)), AudioState::Initial);
    }
}

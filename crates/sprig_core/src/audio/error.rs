//! Audio error types
//!
//! Provides error handling for sound file loading and device operations.

use std::fmt;
use std::io;

/// Error type for audio operations
#[derive(Debug)]
pub enum AudioError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// The file extension does not name a supported sound format
    UnsupportedFormat(String),
    /// The file header could not be parsed
    MalformedHeader(String),
    /// The device refused the request (out of voices, unknown handle)
    Device(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::Io(err) => write!(f, "Audio IO error: {}", err),
            AudioError::UnsupportedFormat(ext) => write!(f, "Unsupported sound format: {}", ext),
            AudioError::MalformedHeader(msg) => write!(f, "Malformed sound header: {}", msg),
            AudioError::Device(msg) => write!(f, "Audio device error: {}", msg),
        }
    }
}

impl std::error::Error for AudioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AudioError {
    fn from(err: io::Error) -> Self {
        AudioError::Io(err)
    }
}

//! Sound file formats and header probing
//!
//! Only the headers are read: enough to know the PCM layout and the length
//! of the sample data, from which the playback duration follows.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::AudioError;

/// Container format, chosen by file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundFormat {
    /// RIFF/WAVE
    Wav,
    /// Sun/NeXT `.au`
    Au,
    /// Headerless PCM with a configured layout
    Raw,
}

impl SoundFormat {
    /// Pick the format from the path's extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self, AudioError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "wav" | "wave" => Ok(SoundFormat::Wav),
            "au" | "snd" => Ok(SoundFormat::Au),
            "raw" | "pcm" => Ok(SoundFormat::Raw),
            _ => Err(AudioError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Layout of PCM sample data
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
            bits_per_sample: 16,
        }
    }
}

impl PcmFormat {
    pub fn bytes_per_second(&self) -> u64 {
        self.sample_rate as u64 * self.channels as u64 * (self.bits_per_sample as u64 / 8).max(1)
    }
}

/// What a header says about a sound
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoundInfo {
    pub pcm: PcmFormat,
    /// Length of the sample data in bytes
    pub data_len: u64,
}

impl SoundInfo {
    /// Playback length in seconds at normal pitch
    pub fn duration(&self) -> f32 {
        let rate = self.pcm.bytes_per_second();
        if rate == 0 {
            return 0.0;
        }
        self.data_len as f32 / rate as f32
    }
}

/// Parse the header of `bytes` as `format`. `raw` describes headerless data.
pub fn probe(bytes: &[u8], format: SoundFormat, raw: PcmFormat) -> Result<SoundInfo, AudioError> {
    match format {
        SoundFormat::Wav => probe_wav(bytes),
        SoundFormat::Au => probe_au(bytes),
        SoundFormat::Raw => Ok(SoundInfo {
            pcm: raw,
            data_len: bytes.len() as u64,
        }),
    }
}

fn read_u16_le(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes(bytes.get(at..at + 2)?.try_into().ok()?))
}

fn read_u32_le(bytes: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_le_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

fn read_u32_be(bytes: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

fn probe_wav(bytes: &[u8]) -> Result<SoundInfo, AudioError> {
    let malformed = |msg: &str| AudioError::MalformedHeader(format!("wav: {}", msg));
    if bytes.get(0..4) != Some(b"RIFF") || bytes.get(8..12) != Some(b"WAVE") {
        return Err(malformed("missing RIFF/WAVE signature"));
    }

    let mut pcm = None;
    let mut offset = 12;
    while let Some(size) = read_u32_le(bytes, offset + 4) {
        let id = &bytes[offset..offset + 4];
        let body = offset + 8;
        match id {
            b"fmt " => {
                let channels = read_u16_le(bytes, body + 2).ok_or_else(|| malformed("short fmt chunk"))?;
                let sample_rate = read_u32_le(bytes, body + 4).ok_or_else(|| malformed("short fmt chunk"))?;
                let bits_per_sample = read_u16_le(bytes, body + 14).ok_or_else(|| malformed("short fmt chunk"))?;
                pcm = Some(PcmFormat { sample_rate, channels, bits_per_sample });
            }
            b"data" => {
                let pcm = pcm.ok_or_else(|| malformed("data chunk before fmt chunk"))?;
                let available = bytes.len().saturating_sub(body) as u64;
                return Ok(SoundInfo { pcm, data_len: (size as u64).min(available) });
            }
            _ => {}
        }
        // Chunks are padded to an even size
        offset = body + size as usize + (size as usize & 1);
    }
    Err(malformed("no data chunk"))
}

fn probe_au(bytes: &[u8]) -> Result<SoundInfo, AudioError> {
    let malformed = |msg: &str| AudioError::MalformedHeader(format!("au: {}", msg));
    if bytes.get(0..4) != Some(b".snd") {
        return Err(malformed("missing .snd signature"));
    }
    let header = |at| read_u32_be(bytes, at).ok_or_else(|| malformed("truncated header"));
    let data_offset = header(4)? as usize;
    let data_size = header(8)?;
    let encoding = header(12)?;
    let sample_rate = header(16)?;
    let channels = header(20)?;

    let bits_per_sample = match encoding {
        1 | 2 => 8,
        3 => 16,
        4 => 24,
        5 => 32,
        other => return Err(malformed(&format!("unsupported encoding {}", other))),
    };
    let available = bytes.len().saturating_sub(data_offset) as u64;
    let data_len = if data_size == u32::MAX {
        available
    } else {
        (data_size as u64).min(available)
    };
    Ok(SoundInfo {
        pcm: PcmFormat {
            sample_rate,
            channels: channels as u16,
            bits_per_sample,
        },
        data_len,
    })
}

//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`SPRIG_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};

use sprig_core::audio::PcmFormat;
use sprig_core::BoundsType;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Audio configuration
    #[serde(default)]
    pub audio: AudioConfig,
    /// Scene graph configuration
    #[serde(default)]
    pub scene: SceneConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`SPRIG_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Optional
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // SPRIG_AUDIO__DEFAULT_GAIN=0.5 -> audio.default_gain = 0.5
        figment = figment.merge(Env::prefixed("SPRIG_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Audio configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate assumed for headerless (`.raw`/`.pcm`) files
    pub sample_rate: u32,
    /// Channel count assumed for headerless files
    pub channels: u16,
    /// Bits per sample assumed for headerless files
    pub bits_per_sample: u16,
    /// Gain given to newly created sources
    pub default_gain: f32,
    /// Maximum number of simultaneously existing sources
    pub max_sources: usize,
    /// Sound played by the demo, attached to a moving node
    pub ambient_sound: Option<PathBuf>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        let pcm = PcmFormat::default();
        Self {
            sample_rate: pcm.sample_rate,
            channels: pcm.channels,
            bits_per_sample: pcm.bits_per_sample,
            default_gain: 1.0,
            max_sources: 32,
            ambient_sound: None,
        }
    }
}

impl AudioConfig {
    /// Layout of headerless sample data
    pub fn to_raw_format(&self) -> PcmFormat {
        PcmFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
            bits_per_sample: self.bits_per_sample,
        }
    }
}

/// Scene graph configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Bounding volume kind given to new nodes (none, box, sphere)
    pub default_bounds_type: BoundsType,
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.audio.sample_rate, 44_100);
        assert_eq!(config.audio.default_gain, 1.0);
        assert_eq!(config.scene.default_bounds_type, BoundsType::None);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("sample_rate"));
        assert!(toml.contains("default_bounds_type"));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: AppConfig = toml::from_str("[audio]\nchannels = 1\n").unwrap();
        assert_eq!(config.audio.channels, 1);
        assert_eq!(config.audio.sample_rate, 44_100);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_to_raw_format() {
        let audio = AudioConfig {
            sample_rate: 8000,
            channels: 1,
            bits_per_sample: 8,
            ..AudioConfig::default()
        };
        let pcm = audio.to_raw_format();
        assert_eq!(pcm.sample_rate, 8000);
        assert_eq!(pcm.bytes_per_second(), 8000);
    }
}

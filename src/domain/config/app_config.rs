//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::capture::{AudioFormat, CaptureSettings, DEFAULT_BITRATE, DEFAULT_SAMPLE_RATE};

/// Default Gemini model used for voice message transcription
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub format: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub bitrate: Option<u32>,
    pub recordings_dir: Option<String>,
    pub transcribe: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            api_key: None,
            model: Some(DEFAULT_MODEL.to_string()),
            format: Some(AudioFormat::LinearPcm.to_string()),
            sample_rate: Some(DEFAULT_SAMPLE_RATE),
            channels: Some(1),
            bitrate: Some(DEFAULT_BITRATE),
            recordings_dir: None,
            transcribe: Some(false),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            api_key: other.api_key.or(self.api_key),
            model: other.model.or(self.model),
            format: other.format.or(self.format),
            sample_rate: other.sample_rate.or(self.sample_rate),
            channels: other.channels.or(self.channels),
            bitrate: other.bitrate.or(self.bitrate),
            recordings_dir: other.recordings_dir.or(self.recordings_dir),
            transcribe: other.transcribe.or(self.transcribe),
        }
    }

    /// Get format as parsed AudioFormat, or default if not set/invalid
    pub fn format_or_default(&self) -> AudioFormat {
        self.format
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get model name, or the default model if not set
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Get transcribe setting, or false if not set
    pub fn transcribe_or_default(&self) -> bool {
        self.transcribe.unwrap_or(false)
    }

    /// Directory new recordings are written to
    pub fn recordings_dir_or_default(&self) -> PathBuf {
        match self.recordings_dir.as_deref() {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("chat-composer")
                .join("recordings"),
        }
    }

    /// Build capture settings from the configured values
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings::new(self.format_or_default())
            .with_sample_rate(self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE))
            .with_channels(self.channels.unwrap_or(1))
            .with_bitrate(self.bitrate.unwrap_or(DEFAULT_BITRATE))
    }
}

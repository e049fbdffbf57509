//! Capture settings value object

use crate::domain::capture::AudioFormat;
use crate::domain::error::InvalidSettingsError;

/// Default sample rate for voice messages
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Default encoder bitrate (bits per second)
pub const DEFAULT_BITRATE: u32 = 128_000;

/// Bit depths accepted for uncompressed PCM
pub const PCM_BIT_DEPTHS: &[u16] = &[8, 16, 24, 32];

/// Settings for a single recording session.
/// Immutable once handed to a capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    /// Four-character code of the encoded format
    pub format_id: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels in the encoded file
    pub channels: u16,
    /// Encoder bitrate for compressed formats
    pub bitrate: u32,
    /// PCM only: bits per sample
    pub pcm_bit_depth: u16,
    /// PCM only: floating point samples
    pub pcm_is_float: bool,
    /// PCM only: big-endian samples
    pub pcm_is_big_endian: bool,
    /// PCM only: one buffer per channel
    pub pcm_is_non_interleaved: bool,
}

impl CaptureSettings {
    /// Default settings for the given format
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format_id: format.code(),
            ..Self::default()
        }
    }

    /// Set the sample rate
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the channel count
    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    /// Set the encoder bitrate
    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = bitrate;
        self
    }

    /// The format, if the code is one of the recognized formats
    pub fn format(&self) -> Option<AudioFormat> {
        AudioFormat::from_code(self.format_id)
    }

    /// File extension for recordings made with these settings
    pub fn file_extension(&self) -> Option<&'static str> {
        self.format().map(|f| f.extension())
    }

    /// Whether the PCM-only fields apply
    pub fn is_pcm(&self) -> bool {
        self.format() == Some(AudioFormat::LinearPcm)
    }

    /// Check numeric fields. The format code is checked separately by the
    /// capture session so it can report the code that was rejected.
    pub fn validate(&self) -> Result<(), InvalidSettingsError> {
        if self.sample_rate == 0 {
            return Err(InvalidSettingsError::new("sample_rate", "must be greater than zero"));
        }
        if self.channels == 0 {
            return Err(InvalidSettingsError::new("channels", "must be greater than zero"));
        }
        if self.is_pcm() {
            if !PCM_BIT_DEPTHS.contains(&self.pcm_bit_depth) {
                return Err(InvalidSettingsError::new(
                    "pcm_bit_depth",
                    "must be one of 8, 16, 24, 32",
                ));
            }
            if self.pcm_is_float && self.pcm_bit_depth != 32 {
                return Err(InvalidSettingsError::new(
                    "pcm_bit_depth",
                    "float samples require 32 bits",
                ));
            }
        }
        Ok(())
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            format_id: AudioFormat::LinearPcm.code(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            bitrate: DEFAULT_BITRATE,
            pcm_bit_depth: 16,
            pcm_is_float: false,
            pcm_is_big_endian: false,
            pcm_is_non_interleaved: false,
        }
    }
}

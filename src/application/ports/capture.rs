//! Audio capture port interfaces

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::capture::{fourcc_to_string, CaptureSettings};
use crate::domain::error::InvalidSettingsError;

/// Capture errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error("Unsupported audio format '{}'", fourcc_to_string(*.0))]
    UnsupportedFormat(u32),

    #[error(transparent)]
    InvalidSettings(#[from] InvalidSettingsError),

    #[error("No audio input device available")]
    NoAudioDevice,

    #[error("Failed to activate audio input: {0}")]
    HardwareActivation(String),

    #[error("Failed to encode recording: {0}")]
    Encoding(String),
}

impl CaptureError {
    /// Whether the user can fix this by trying again (e.g. granting permission)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

/// Metering callback: (elapsed seconds, every waveform sample so far)
pub type MeteringCallback = Arc<dyn Fn(f64, Vec<f32>) + Send + Sync>;

/// Port for the microphone hardware
pub trait InputDevice: Send + Sync {
    /// Activate the microphone and start writing an encoded file.
    ///
    /// # Arguments
    /// * `settings` - Validated capture settings
    /// * `destination` - File the encoded recording is written to
    ///
    /// # Returns
    /// A live capture stream, or an error when the hardware cannot be activated.
    /// No file is left behind on error.
    fn open(
        &self,
        settings: &CaptureSettings,
        destination: &Path,
    ) -> Result<Box<dyn CaptureStream>, CaptureError>;
}

/// A live microphone capture
pub trait CaptureStream: Send {
    /// Instantaneous input power in dBFS (about -160 to 0)
    fn average_power(&self) -> f32;

    /// Deactivate the microphone and finish the file.
    ///
    /// Blocks until the recording is fully written, so the file can be read
    /// or played as soon as this returns.
    fn stop(self: Box<Self>);
}

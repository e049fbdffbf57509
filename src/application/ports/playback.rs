//! Audio playback port interfaces

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

/// Playback errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    #[error("Failed to load recording: {0}")]
    LoadFailed(String),

    #[error("Audio output not available: {0}")]
    DeviceNotAvailable(String),

    #[error("Failed to seek: {0}")]
    SeekFailed(String),
}

/// Port for the audio output hardware
pub trait OutputDevice: Send + Sync {
    /// Load a recording, paused at its start
    fn load(&self, path: &Path) -> Result<Box<dyn PlayerHandle>, PlaybackError>;
}

/// A loaded recording on the output device
pub trait PlayerHandle: Send {
    /// Start or resume playback. Restarts from the beginning after the end was reached.
    fn play(&mut self);

    /// Pause playback, keeping the position
    fn pause(&mut self);

    /// Move the play head
    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError>;

    /// Current play head position
    fn current_time(&self) -> Duration;

    /// Total length of the loaded recording
    fn duration(&self) -> Duration;

    /// Whether audio is being produced. False once the end is reached.
    fn is_playing(&self) -> bool;
}

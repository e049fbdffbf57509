//! Application layer - Sessions, the composer state machine and port interfaces
//!
//! Contains the recording and playback sessions, the input view model
//! driving them, and trait definitions for external system interactions.

pub mod capture_session;
pub mod composer;
pub mod metering_timer;
pub mod playback_session;
pub mod ports;
mod timer;

// Re-export the main types
pub use capture_session::{AudioCaptureSession, CaptureRegistry};
pub use composer::{ComposerEvent, EditCallback, InputSnapshot, InputViewModel};
pub use metering_timer::{Meter, MeteringTimer};
pub use playback_session::{
    AudioPlaybackSession, PlaybackEvent, PlaybackListener, PlaybackProgress, PlaybackRegistry,
    PROGRESS_INTERVAL,
};

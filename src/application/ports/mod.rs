//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod permission;
pub mod playback;
pub mod sender;
pub mod transcriber;

// Re-export common types
pub use capture::{CaptureError, CaptureStream, InputDevice, MeteringCallback};
pub use config::ConfigStore;
pub use permission::{MicrophonePermission, PermissionStatus};
pub use playback::{OutputDevice, PlaybackError, PlayerHandle};
pub use sender::DraftSender;
pub use transcriber::{Transcriber, TranscriptionError};

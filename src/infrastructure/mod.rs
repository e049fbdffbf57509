//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with cpal, rodio, the Gemini API and the file system.

pub mod config;
pub mod permission;
pub mod playback;
pub mod recording;
pub mod transcription;

// Re-export adapters
pub use config::XdgConfigStore;
pub use permission::{DeviceProbePermission, StaticPermission};
pub use playback::RodioOutputDevice;
pub use recording::CpalInputDevice;
pub use transcription::GeminiTranscriber;

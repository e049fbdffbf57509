//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod capture;
pub mod composer;
pub mod config;
pub mod error;
pub mod recording;

// Re-export common types
pub use capture::{AudioFormat, CaptureSettings};
pub use composer::{DraftMessage, InputAction, InputAttachments, InputState, Media};
pub use config::AppConfig;
pub use error::*;
pub use recording::RecordingArtifact;

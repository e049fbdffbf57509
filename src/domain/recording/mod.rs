//! Recording domain module

mod artifact;

pub use artifact::RecordingArtifact;

//! Recording artifact entity

use std::path::{Path, PathBuf};

use serde::Serialize;

/// A recorded voice clip: file location, length and waveform.
///
/// Created empty when recording starts and updated on every metering tick
/// until the recording stops.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordingArtifact {
    url: Option<PathBuf>,
    duration: f64,
    waveform_samples: Vec<f32>,
}

impl RecordingArtifact {
    /// Create an empty artifact for a recording that is about to start
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an artifact for an existing file
    pub fn from_file(url: impl Into<PathBuf>, duration: f64, waveform_samples: Vec<f32>) -> Self {
        Self {
            url: Some(url.into()),
            duration,
            waveform_samples,
        }
    }

    /// File the recording is written to, once capture has started
    pub fn url(&self) -> Option<&Path> {
        self.url.as_deref()
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Normalized amplitude samples in [0, 1], one per metering tick
    pub fn waveform_samples(&self) -> &[f32] {
        &self.waveform_samples
    }

    /// Attach the destination file
    pub fn set_url(&mut self, url: impl Into<PathBuf>) {
        self.url = Some(url.into());
    }

    /// Apply a metering update
    pub fn update(&mut self, duration: f64, waveform_samples: Vec<f32>) {
        self.duration = duration;
        self.waveform_samples = waveform_samples;
    }

    /// Whether the recording is the same file as another
    pub fn same_file(&self, other: &RecordingArtifact) -> bool {
        self.url.is_some() && self.url == other.url
    }

    /// Duration formatted as m:ss
    pub fn formatted_duration(&self) -> String {
        let total = self.duration.max(0.0).round() as u64;
        format!("{}:{:02}", total / 60, total % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_artifact_is_empty() {
        let artifact = RecordingArtifact::new();
        assert!(artifact.url().is_none());
        assert_eq!(artifact.duration(), 0.0);
        assert!(artifact.waveform_samples().is_empty());
    }

    #[test]
    fn update_replaces_samples() {
        let mut artifact = RecordingArtifact::new();
        artifact.update(0.1, vec![0.5]);
        artifact.update(0.2, vec![0.5, 0.7]);
        assert_eq!(artifact.duration(), 0.2);
        assert_eq!(artifact.waveform_samples(), &[0.5, 0.7]);
    }

    #[test]
    fn same_file_needs_a_path() {
        let a = RecordingArtifact::new();
        let b = RecordingArtifact::new();
        assert!(!a.same_file(&b));

        let c = RecordingArtifact::from_file("/tmp/a.wav", 1.0, vec![]);
        let d = RecordingArtifact::from_file("/tmp/a.wav", 2.0, vec![0.1]);
        assert!(c.same_file(&d));
    }

    #[test]
    fn formatted_duration() {
        assert_eq!(RecordingArtifact::from_file("a", 0.4, vec![]).formatted_duration(), "0:00");
        assert_eq!(RecordingArtifact::from_file("a", 9.6, vec![]).formatted_duration(), "0:10");
        assert_eq!(RecordingArtifact::from_file("a", 125.0, vec![]).formatted_duration(), "2:05");
    }
}

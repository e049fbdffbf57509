//! CLI presenter for output formatting

use std::io::{self, Write};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::{InputSnapshot, PlaybackProgress};
use crate::domain::capture::{fourcc_to_string, AudioFormat};
use crate::domain::composer::InputState;
use crate::domain::recording::RecordingArtifact;

/// Block characters for waveform levels, quietest first
const WAVEFORM_BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Waveform samples shown in the status line
const WAVEFORM_WIDTH: usize = 32;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Whether a spinner is on screen
    pub fn is_spinning(&self) -> bool {
        self.spinner.is_some()
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (drafts and command results)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Output text to stdout without newline
    pub fn output_inline(&self, text: &str) {
        print!("{}", text);
        let _ = io::stdout().flush();
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print the format table
    pub fn formats(&self, formats: &[AudioFormat]) {
        for format in formats {
            println!(
                "{:<7} {:<7} {:<6} {}",
                format.as_str().cyan(),
                format!("'{}'", fourcc_to_string(format.code())),
                format.extension(),
                format.label()
            );
        }
    }

    /// Print the composer status line to stderr
    pub fn status(&self, snapshot: &InputSnapshot) {
        eprintln!("{}", self.format_status(snapshot));
    }

    /// One line describing the composer
    pub fn format_status(&self, snapshot: &InputSnapshot) -> String {
        let state = match snapshot.state {
            InputState::Empty | InputState::HasContent => snapshot.state.as_str().normal(),
            InputState::WaitingPermission => snapshot.state.as_str().yellow(),
            InputState::RecordingHeld | InputState::RecordingTapped => {
                snapshot.state.as_str().red().bold()
            }
            InputState::HasRecording | InputState::Playing | InputState::Paused => {
                snapshot.state.as_str().green()
            }
            InputState::Editing => snapshot.state.as_str().magenta(),
        };

        let mut line = format!("{} {}", "●".cyan(), state);
        if !snapshot.text.is_empty() {
            line.push_str(&format!(" \"{}\"", snapshot.text));
        }
        if snapshot.media_count > 0 {
            line.push_str(&format!(" [{} media]", snapshot.media_count));
        }
        if let Some(recording) = &snapshot.recording {
            line.push_str(&format!(" {}", self.format_recording(recording)));
        }
        if matches!(snapshot.state, InputState::Playing | InputState::Paused) {
            line.push_str(&format!(" {}", self.format_playback(&snapshot.playback)));
        }
        if snapshot.is_transcribing {
            line.push_str(" (transcribing)");
        }
        if snapshot.can_send {
            line.push_str(&format!(" {}", "⏎ send".dimmed()));
        }
        line
    }

    /// Duration and waveform of a recording
    pub fn format_recording(&self, recording: &RecordingArtifact) -> String {
        format!(
            "{} {}",
            recording.formatted_duration(),
            format_waveform(recording.waveform_samples(), WAVEFORM_WIDTH).cyan()
        )
    }

    /// Playback progress bar
    pub fn format_playback(&self, playback: &PlaybackProgress) -> String {
        let bar_width = 20;
        let filled = ((playback.progress.clamp(0.0, 1.0)) * bar_width as f64) as usize;
        let empty = bar_width - filled;

        format!(
            "[{}{}] -{}:{:02}",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            playback.seconds_left / 60,
            playback.seconds_left % 60
        )
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the last `width` samples as block characters
pub fn format_waveform(samples: &[f32], width: usize) -> String {
    let start = samples.len().saturating_sub(width);
    samples[start..]
        .iter()
        .map(|&s| {
            let level = s.clamp(0.0, 1.0) * (WAVEFORM_BLOCKS.len() - 1) as f32;
            WAVEFORM_BLOCKS[level.round() as usize]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveform_maps_levels_to_blocks() {
        assert_eq!(format_waveform(&[0.0, 0.5, 1.0], 10), "▁▅█");
        assert_eq!(format_waveform(&[], 10), "");
    }

    #[test]
    fn waveform_keeps_latest_samples() {
        let samples = [0.0, 0.0, 1.0, 1.0];
        assert_eq!(format_waveform(&samples, 2), "██");
    }

    #[test]
    fn waveform_clamps_out_of_range() {
        assert_eq!(format_waveform(&[-1.0, 2.0, f32::NAN], 3), "▁█▁");
    }

    #[test]
    fn playback_shows_time_left() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let progress = PlaybackProgress {
            playing: true,
            duration: 90.0,
            progress: 0.5,
            seconds_left: 45,
        };
        let line = presenter.format_playback(&progress);
        assert!(line.ends_with("-0:45"));
        assert_eq!(line.chars().filter(|&c| c == '█').count(), 10);
    }

    #[test]
    fn status_mentions_state_text_and_recording() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let snapshot = InputSnapshot {
            state: InputState::HasRecording,
            text: "hi".to_string(),
            recording: Some(RecordingArtifact::from_file("a.wav", 2.0, vec![1.0])),
            can_send: true,
            ..Default::default()
        };
        let line = presenter.format_status(&snapshot);
        assert!(line.contains("has-recording"));
        assert!(line.contains("\"hi\""));
        assert!(line.contains("0:02 █"));
        assert!(line.contains("send"));
    }
}

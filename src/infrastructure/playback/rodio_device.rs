//! Rodio-based playback adapter
//!
//! `rodio::OutputStream` is not `Send`; it lives on a dedicated thread for the
//! life of the process and only its handle is shared. The stream is opened on
//! first use.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, OnceLock};
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use crate::application::ports::{OutputDevice, PlaybackError, PlayerHandle};

/// Shared handle to the default output device
fn output_handle() -> Result<OutputStreamHandle, PlaybackError> {
    static HANDLE: OnceLock<Result<OutputStreamHandle, String>> = OnceLock::new();
    HANDLE
        .get_or_init(start_output)
        .clone()
        .map_err(PlaybackError::DeviceNotAvailable)
}

fn start_output() -> Result<OutputStreamHandle, String> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("rodio-output".into())
        .spawn(move || match OutputStream::try_default() {
            Ok((stream, handle)) => {
                if tx.send(Ok(handle)).is_err() {
                    return;
                }
                let _stream = stream;
                loop {
                    thread::park();
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e.to_string()));
            }
        })
        .map_err(|e| e.to_string())?;
    rx.recv().map_err(|e| e.to_string())?
}

fn decode(path: &Path) -> Result<Decoder<BufReader<File>>, PlaybackError> {
    let file = File::open(path).map_err(|e| PlaybackError::LoadFailed(e.to_string()))?;
    Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::LoadFailed(e.to_string()))
}

/// Default system audio output
#[derive(Debug, Default)]
pub struct RodioOutputDevice;

impl RodioOutputDevice {
    pub fn new() -> Self {
        Self
    }
}

impl OutputDevice for RodioOutputDevice {
    fn load(&self, path: &Path) -> Result<Box<dyn PlayerHandle>, PlaybackError> {
        let source = decode(path)?;
        let duration = source.total_duration().unwrap_or(Duration::ZERO);

        let handle = output_handle()?;
        let sink = Sink::try_new(&handle).map_err(|e| PlaybackError::DeviceNotAvailable(e.to_string()))?;
        sink.pause();
        sink.append(source);

        debug!(path = %path.display(), ?duration, "Decoder ready");
        Ok(Box::new(RodioPlayer {
            sink,
            path: path.to_path_buf(),
            duration,
        }))
    }
}

/// A recording queued on a rodio sink
pub struct RodioPlayer {
    sink: Sink,
    path: PathBuf,
    duration: Duration,
}

impl RodioPlayer {
    /// Queue the file again once the sink played it out
    fn rewind_if_finished(&mut self) {
        if !self.sink.empty() {
            return;
        }
        match decode(&self.path) {
            Ok(source) => self.sink.append(source),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to reload recording"),
        }
    }
}

impl PlayerHandle for RodioPlayer {
    fn play(&mut self) {
        self.rewind_if_finished();
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        self.rewind_if_finished();
        self.sink
            .try_seek(position)
            .map_err(|e| PlaybackError::SeekFailed(e.to_string()))
    }

    fn current_time(&self) -> Duration {
        if self.sink.empty() {
            return self.duration;
        }
        self.sink.get_pos()
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_fails_to_load() {
        let result = RodioOutputDevice::new().load(Path::new("/nonexistent/clip.wav"));
        assert!(matches!(result, Err(PlaybackError::LoadFailed(_))));
    }

    #[test]
    fn unknown_container_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.ulaw");
        std::fs::write(&path, b"not an audio container").unwrap();

        let result = RodioOutputDevice::new().load(&path);
        assert!(matches!(result, Err(PlaybackError::LoadFailed(_))));
    }

    #[test]
    #[ignore = "Requires audio hardware"]
    fn plays_a_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..16_000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let mut player = RodioOutputDevice::new().load(&path).unwrap();
        assert_eq!(player.duration(), Duration::from_secs(1));
        player.play();
        assert!(player.is_playing());
        player.pause();
        assert!(!player.is_playing());
    }
}

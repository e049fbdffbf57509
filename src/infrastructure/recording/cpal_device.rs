//! Microphone input using cpal
//!
//! The cpal stream is not `Send`, so each capture runs on its own thread. The
//! thread buffers mono samples and publishes the level of the latest buffer.
//! Stopping the capture joins the thread, which resamples to the requested
//! rate and encodes the file before it exits.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use rubato::{FftFixedIn, Resampler};
use tracing::{debug, info, warn};

use super::encoder::Encoder;
use crate::application::ports::{CaptureError, CaptureStream, InputDevice};
use crate::domain::capture::{power_db, CaptureSettings, SILENCE_DB};

/// How long to wait for the audio thread to report the stream is running
const START_TIMEOUT: Duration = Duration::from_secs(2);

/// Default system microphone
#[derive(Debug, Default)]
pub struct CpalInputDevice;

impl CpalInputDevice {
    pub fn new() -> Self {
        Self
    }
}

impl InputDevice for CpalInputDevice {
    fn open(
        &self,
        settings: &CaptureSettings,
        destination: &Path,
    ) -> Result<Box<dyn CaptureStream>, CaptureError> {
        let format = settings
            .format()
            .ok_or(CaptureError::UnsupportedFormat(settings.format_id))?;
        let encoder = Encoder::for_format(format).ok_or_else(|| {
            CaptureError::HardwareActivation(format!("no encoder for {}", format.label()))
        })?;

        let level = Arc::new(AtomicU32::new(SILENCE_DB.to_bits()));
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let (stop_tx, stop_rx) = mpsc::channel();

        let job = CaptureJob {
            settings: settings.clone(),
            destination: destination.to_path_buf(),
            encoder,
            level: Arc::clone(&level),
        };
        let worker = thread::Builder::new()
            .name("cpal-capture".into())
            .spawn(move || job.run(ready_tx, stop_rx))
            .map_err(|e| CaptureError::HardwareActivation(e.to_string()))?;

        match ready_rx.recv_timeout(START_TIMEOUT) {
            Ok(Ok(())) => Ok(Box::new(CpalCaptureStream {
                level,
                stop: stop_tx,
                worker,
            })),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CaptureError::HardwareActivation(
                "timed out starting audio input".into(),
            )),
        }
    }
}

/// Handle to a running capture thread
struct CpalCaptureStream {
    level: Arc<AtomicU32>,
    stop: Sender<()>,
    worker: JoinHandle<()>,
}

impl CaptureStream for CpalCaptureStream {
    fn average_power(&self) -> f32 {
        f32::from_bits(self.level.load(Ordering::Relaxed))
    }

    fn stop(self: Box<Self>) {
        let Self { stop, worker, .. } = *self;
        // The thread also stops when the sender is dropped
        let _ = stop.send(());
        drop(stop);
        if worker.join().is_err() {
            warn!("Capture thread panicked while encoding");
        }
    }
}

struct CaptureJob {
    settings: CaptureSettings,
    destination: PathBuf,
    encoder: Encoder,
    level: Arc<AtomicU32>,
}

impl CaptureJob {
    fn run(self, ready: SyncSender<Result<(), CaptureError>>, stop: Receiver<()>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (stream, device_rate) = match self.start_stream(&buffer) {
            Ok(started) => started,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };

        if ready.send(Ok(())).is_err() {
            debug!("Capture abandoned before it started");
            return;
        }

        let _ = stop.recv();
        drop(stream);

        let samples = match buffer.lock() {
            Ok(mut buffer) => std::mem::take(&mut *buffer),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        self.finish(&samples, device_rate);
    }

    fn start_stream(&self, buffer: &Arc<Mutex<Vec<f32>>>) -> Result<(cpal::Stream, u32), CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoAudioDevice)?;
        let (config, sample_format) = input_config(&device, self.settings.sample_rate)?;
        let channels = config.channels;
        debug!(
            device_rate = config.sample_rate.0,
            channels,
            format = ?sample_format,
            "Opening input stream"
        );

        let stream = match sample_format {
            SampleFormat::F32 => {
                let buffer = Arc::clone(buffer);
                let level = Arc::clone(&self.level);
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        push_frames(data, channels, &buffer, &level);
                    },
                    stream_error,
                    None,
                )
            }
            SampleFormat::I16 => {
                let buffer = Arc::clone(buffer);
                let level = Arc::clone(&self.level);
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let data: Vec<f32> = data.iter().map(|&s| f32::from(s) / 32768.0).collect();
                        push_frames(&data, channels, &buffer, &level);
                    },
                    stream_error,
                    None,
                )
            }
            other => {
                return Err(CaptureError::HardwareActivation(format!(
                    "unsupported sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| CaptureError::HardwareActivation(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::HardwareActivation(e.to_string()))?;

        Ok((stream, config.sample_rate.0))
    }

    fn finish(&self, samples: &[f32], device_rate: u32) {
        let samples = match resample(samples, device_rate, self.settings.sample_rate) {
            Ok(samples) => samples,
            Err(e) => {
                warn!(error = %e, "Resampling failed");
                return;
            }
        };

        match self.encoder.write(&self.destination, &samples, &self.settings) {
            Ok(()) => info!(
                path = %self.destination.display(),
                samples = samples.len(),
                "Recording encoded"
            ),
            Err(e) => warn!(
                path = %self.destination.display(),
                error = %e,
                "Failed to encode recording"
            ),
        }
    }
}

fn stream_error(err: cpal::StreamError) {
    warn!(error = %err, "Audio input stream error");
}

fn push_frames(data: &[f32], channels: u16, buffer: &Mutex<Vec<f32>>, level: &AtomicU32) {
    let mono = downmix(data, channels);
    level.store(power_db(&mono).to_bits(), Ordering::Relaxed);
    if let Ok(mut buffer) = buffer.lock() {
        buffer.extend_from_slice(&mono);
    }
}

/// Pick an input configuration, preferring mono and the requested rate
fn input_config(
    device: &cpal::Device,
    target_rate: u32,
) -> Result<(StreamConfig, SampleFormat), CaptureError> {
    let supported_configs = device
        .supported_input_configs()
        .map_err(|e| CaptureError::HardwareActivation(format!("Failed to get configs: {}", e)))?;

    let includes_target = |c: &cpal::SupportedStreamConfigRange| {
        c.min_sample_rate().0 <= target_rate && c.max_sample_rate().0 >= target_rate
    };

    let mut best: Option<cpal::SupportedStreamConfigRange> = None;
    for config in supported_configs {
        if config.sample_format() != SampleFormat::I16
            && config.sample_format() != SampleFormat::F32
        {
            continue;
        }

        let is_better = match &best {
            None => true,
            Some(current) => {
                let fewer_channels = config.channels() < current.channels();
                let better_rate = includes_target(&config) && !includes_target(current);
                better_rate || (fewer_channels && includes_target(&config) == includes_target(current))
            }
        };
        if is_better {
            best = Some(config);
        }
    }

    let range = best.ok_or_else(|| {
        CaptureError::HardwareActivation("No suitable input config found".into())
    })?;

    let sample_rate = if includes_target(&range) {
        SampleRate(target_rate)
    } else {
        range.max_sample_rate()
    };

    let config = StreamConfig {
        channels: range.channels(),
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };
    Ok((config, range.sample_format()))
}

/// Average interleaved frames down to one channel
fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Resample mono audio between rates
fn resample(samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>, CaptureError> {
    if from == to || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let output_len = (samples.len() as f64 * f64::from(to) / f64::from(from)).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(from as usize, to as usize, 1024, 2, 1)
        .map_err(|e| CaptureError::Encoding(format!("Resampler init failed: {}", e)))?;

    let mut output = Vec::with_capacity(output_len + 1024);
    let mut input_pos = 0;
    while input_pos < samples.len() {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(samples.len());
        let mut chunk = samples[input_pos..end_pos].to_vec();
        chunk.resize(frames_needed, 0.0);

        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| CaptureError::Encoding(format!("Resampling failed: {}", e)))?;
        output.extend_from_slice(&resampled[0]);
        input_pos = end_pos;
    }

    output.truncate(output_len);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capture::AudioFormat;

    #[test]
    fn downmix_single_channel() {
        let mono = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix(&mono, 1), mono);
    }

    #[test]
    fn downmix_two_channels() {
        let stereo = vec![0.25, 0.75, -0.5, 0.5];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.0]);
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let samples = vec![0.1; 100];
        assert_eq!(resample(&samples, 16_000, 16_000).unwrap(), samples);
    }

    #[test]
    fn resample_halves_length() {
        let samples = vec![0.0; 48_000];
        let out = resample(&samples, 48_000, 24_000).unwrap();
        assert_eq!(out.len(), 24_000);
    }

    #[test]
    fn format_without_encoder_fails_before_touching_hardware() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("clip.aac");

        let result = CpalInputDevice::new().open(&CaptureSettings::new(AudioFormat::Aac), &destination);

        assert!(matches!(result, Err(CaptureError::HardwareActivation(_))));
        assert!(!destination.exists());
    }

    #[test]
    #[ignore = "Requires audio hardware"]
    fn records_a_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("clip.wav");

        let stream = CpalInputDevice::new()
            .open(&CaptureSettings::default(), &destination)
            .unwrap();
        std::thread::sleep(Duration::from_millis(300));
        assert!(stream.average_power() <= 0.0);
        stream.stop();

        assert!(destination.exists());
    }
}

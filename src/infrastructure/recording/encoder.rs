//! File encoders for captured audio
//!
//! Input is mono f32 audio already resampled to the requested rate. Each
//! sample is duplicated across the requested channel count.
//!
//! - Linear PCM: WAV via hound, honoring bit depth and float flags
//! - FLAC: 16-bit via flacenc
//! - u-law / a-law: headerless G.711 byte streams

use std::path::Path;

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::domain::capture::{AudioFormat, CaptureSettings};

/// FLAC is always written with 16-bit samples
const FLAC_BITS_PER_SAMPLE: usize = 16;

/// Encoding errors
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("FLAC config error: {0}")]
    Config(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Write failed: {0}")]
    Write(String),
}

impl From<hound::Error> for EncodingError {
    fn from(e: hound::Error) -> Self {
        Self::Write(e.to_string())
    }
}

impl From<std::io::Error> for EncodingError {
    fn from(e: std::io::Error) -> Self {
        Self::Write(e.to_string())
    }
}

/// Formats the capture adapter can write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoder {
    Wav,
    Flac,
    ULaw,
    ALaw,
}

impl Encoder {
    /// The encoder for a format, if one is available
    pub fn for_format(format: AudioFormat) -> Option<Self> {
        match format {
            AudioFormat::LinearPcm => Some(Self::Wav),
            AudioFormat::Flac => Some(Self::Flac),
            AudioFormat::ULaw => Some(Self::ULaw),
            AudioFormat::ALaw => Some(Self::ALaw),
            _ => None,
        }
    }

    /// Encode `samples` into `path`
    pub fn write(
        &self,
        path: &Path,
        samples: &[f32],
        settings: &CaptureSettings,
    ) -> Result<(), EncodingError> {
        let channels = settings.channels.max(1) as usize;
        match self {
            Self::Wav => write_wav(path, samples, settings),
            Self::Flac => {
                let data = encode_flac(samples, channels, settings.sample_rate)?;
                std::fs::write(path, data)?;
                Ok(())
            }
            Self::ULaw => {
                let data = encode_g711(samples, channels, linear_to_ulaw);
                std::fs::write(path, data)?;
                Ok(())
            }
            Self::ALaw => {
                let data = encode_g711(samples, channels, linear_to_alaw);
                std::fs::write(path, data)?;
                Ok(())
            }
        }
    }
}

/// Scale a [-1, 1] sample to a signed integer of `bits` width
fn quantize(sample: f32, bits: u16) -> i32 {
    let max = ((1i64 << (bits - 1)) - 1) as f64;
    (f64::from(sample.clamp(-1.0, 1.0)) * max).round() as i32
}

fn to_i16(sample: f32) -> i16 {
    quantize(sample, 16) as i16
}

fn write_wav(path: &Path, samples: &[f32], settings: &CaptureSettings) -> Result<(), EncodingError> {
    let spec = WavSpec {
        channels: settings.channels.max(1),
        sample_rate: settings.sample_rate,
        bits_per_sample: settings.pcm_bit_depth,
        sample_format: if settings.pcm_is_float {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        for _ in 0..spec.channels {
            match (settings.pcm_is_float, settings.pcm_bit_depth) {
                (true, _) => writer.write_sample(sample)?,
                (false, 8) => writer.write_sample(quantize(sample, 8) as i8)?,
                (false, 16) => writer.write_sample(to_i16(sample))?,
                (false, bits) => writer.write_sample(quantize(sample, bits))?,
            }
        }
    }
    writer.finalize()?;
    Ok(())
}

/// Encode to FLAC bytes
pub fn encode_flac(samples: &[f32], channels: usize, sample_rate: u32) -> Result<Vec<u8>, EncodingError> {
    let interleaved: Vec<i32> = samples
        .iter()
        .flat_map(|&s| std::iter::repeat(i32::from(to_i16(s))).take(channels))
        .collect();

    let config = config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| EncodingError::Config(format!("{:?}", e)))?;

    let source = MemSource::from_samples(
        &interleaved,
        channels,
        FLAC_BITS_PER_SAMPLE,
        sample_rate as usize,
    );

    let flac_stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| EncodingError::Encode(format!("{:?}", e)))?;

    let mut sink = ByteSink::new();
    flac_stream
        .write(&mut sink)
        .map_err(|e| EncodingError::Write(e.to_string()))?;

    Ok(sink.into_inner())
}

fn encode_g711(samples: &[f32], channels: usize, companding: fn(i16) -> u8) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&s| std::iter::repeat(companding(to_i16(s))).take(channels))
        .collect()
}

/// G.711 u-law compression of one 16-bit sample
pub fn linear_to_ulaw(sample: i16) -> u8 {
    const BIAS: i32 = 0x84;
    const CLIP: i32 = 32635;

    let mut pcm = i32::from(sample);
    let sign = if pcm < 0 {
        pcm = -pcm;
        0x80
    } else {
        0
    };
    pcm = pcm.min(CLIP) + BIAS;

    let exponent = 31 - ((pcm >> 7) as u32).leading_zeros();
    let mantissa = (pcm >> (exponent + 3)) & 0x0F;
    !((sign | ((exponent as i32) << 4) | mantissa) as u8)
}

/// G.711 a-law compression of one 16-bit sample
pub fn linear_to_alaw(sample: i16) -> u8 {
    const SEGMENT_END: [i32; 8] = [0x1F, 0x3F, 0x7F, 0xFF, 0x1FF, 0x3FF, 0x7FF, 0xFFF];

    let mut pcm = i32::from(sample) >> 3;
    let mask = if pcm >= 0 {
        0xD5
    } else {
        pcm = -pcm - 1;
        0x55
    };

    let Some(segment) = SEGMENT_END.iter().position(|&end| pcm <= end) else {
        return (0x7F ^ mask) as u8;
    };

    let mut value = (segment as i32) << 4;
    value |= if segment < 2 {
        (pcm >> 1) & 0x0F
    } else {
        (pcm >> segment) & 0x0F
    };
    (value ^ mask) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoders_exist_for_pcm_flac_and_g711_only() {
        assert_eq!(Encoder::for_format(AudioFormat::LinearPcm), Some(Encoder::Wav));
        assert_eq!(Encoder::for_format(AudioFormat::Flac), Some(Encoder::Flac));
        assert_eq!(Encoder::for_format(AudioFormat::ULaw), Some(Encoder::ULaw));
        assert_eq!(Encoder::for_format(AudioFormat::ALaw), Some(Encoder::ALaw));
        assert_eq!(Encoder::for_format(AudioFormat::Aac), None);
        assert_eq!(Encoder::for_format(AudioFormat::Opus), None);
    }

    #[test]
    fn ulaw_reference_values() {
        assert_eq!(linear_to_ulaw(0), 0xFF);
        assert_eq!(linear_to_ulaw(i16::MAX), 0x80);
        assert_eq!(linear_to_ulaw(i16::MIN), 0x00);
    }

    #[test]
    fn alaw_reference_values() {
        assert_eq!(linear_to_alaw(0), 0xD5);
        assert_eq!(linear_to_alaw(i16::MAX), 0xAA);
        assert_eq!(linear_to_alaw(i16::MIN), 0x2A);
    }

    #[test]
    fn quantize_full_scale() {
        assert_eq!(quantize(1.0, 16), 32767);
        assert_eq!(quantize(-1.0, 16), -32767);
        assert_eq!(quantize(2.0, 8), 127);
        assert_eq!(quantize(0.0, 24), 0);
    }

    #[test]
    fn flac_has_magic_header() {
        let silence = vec![0.0f32; 16_000];
        let data = encode_flac(&silence, 1, 16_000).unwrap();
        assert!(data.len() > 50);
        assert_eq!(&data[0..4], b"fLaC");
    }

    #[test]
    fn flac_compresses_a_tone() {
        let samples: Vec<f32> = (0..16_000)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 16_000.0).sin() * 0.5)
            .collect();
        let data = encode_flac(&samples, 1, 16_000).unwrap();
        assert!(data.len() < samples.len() * 2);
    }

    #[test]
    fn wav_honors_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let settings = CaptureSettings::new(AudioFormat::LinearPcm)
            .with_sample_rate(8_000)
            .with_channels(2);

        Encoder::Wav
            .write(&path, &[0.0, 0.5, -0.5, 1.0], &settings)
            .unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 8_000);
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 0, 16384, 16384, -16384, -16384, 32767, 32767]);
    }

    #[test]
    fn g711_writes_one_byte_per_sample_and_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.ulaw");
        let settings = CaptureSettings::new(AudioFormat::ULaw).with_channels(2);

        Encoder::ULaw.write(&path, &[0.0, 0.0, 0.0], &settings).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![0xFF; 6]);
    }
}

//! Metering math: power levels and waveform normalization

use std::time::Duration;

/// Cadence of waveform samples while recording
pub const METERING_INTERVAL: Duration = Duration::from_millis(100);

/// Levels below this are treated as silence when normalizing
pub const METER_FLOOR_DB: f32 = -60.0;

/// Lowest level reported for digital silence
pub const SILENCE_DB: f32 = -160.0;

/// Map a power level in dBFS onto a waveform sample in [0, 1].
/// -60 dB and below map to 0, 0 dB maps to 1.
pub fn normalize_power(power_db: f32) -> f32 {
    let level = power_db.max(METER_FLOOR_DB);
    (1.0 - (level / 60.0 * -1.0)).clamp(0.0, 1.0)
}

/// RMS level of a block of samples in dBFS
pub fn power_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return SILENCE_DB;
    }
    let mean_sq = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    let rms = mean_sq.sqrt();
    if rms <= 0.0 {
        return SILENCE_DB;
    }
    (20.0 * rms.log10()).clamp(SILENCE_DB, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_bounds() {
        assert_eq!(normalize_power(0.0), 1.0);
        assert_eq!(normalize_power(-60.0), 0.0);
        assert_eq!(normalize_power(-120.0), 0.0);
        assert_eq!(normalize_power(6.0), 1.0);
    }

    #[test]
    fn normalize_midpoint() {
        assert!((normalize_power(-30.0) - 0.5).abs() < 1e-6);
        assert!((normalize_power(-15.0) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn normalize_nan_is_silence() {
        assert_eq!(normalize_power(f32::NAN), 0.0);
    }

    #[test]
    fn power_of_silence() {
        assert_eq!(power_db(&[]), SILENCE_DB);
        assert_eq!(power_db(&[0.0; 64]), SILENCE_DB);
    }

    #[test]
    fn power_of_full_scale() {
        let level = power_db(&[1.0, -1.0, 1.0, -1.0]);
        assert!(level.abs() < 1e-4);
    }

    #[test]
    fn power_of_half_scale() {
        let level = power_db(&[0.5; 32]);
        assert!((level - (-6.0206)).abs() < 1e-3);
    }
}

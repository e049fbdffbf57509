//! Capture domain module

mod format;
mod metering;
mod settings;

pub use format::{
    extension_for_code, fourcc, fourcc_to_string, AudioFormat, ALL_FORMATS,
};
pub use metering::{normalize_power, power_db, METERING_INTERVAL, METER_FLOOR_DB, SILENCE_DB};
pub use settings::{CaptureSettings, DEFAULT_BITRATE, DEFAULT_SAMPLE_RATE, PCM_BIT_DEPTHS};

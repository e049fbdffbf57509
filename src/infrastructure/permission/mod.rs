//! Microphone permission adapters

mod device_probe;

pub use device_probe::{DeviceProbePermission, StaticPermission};

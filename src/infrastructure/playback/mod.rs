//! Playback infrastructure module

mod rodio_device;

pub use rodio_device::{RodioOutputDevice, RodioPlayer};

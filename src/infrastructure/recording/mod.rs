//! Recording infrastructure module
//!
//! Microphone capture through cpal with in-crate file encoders.

mod cpal_device;
mod encoder;

pub use cpal_device::CpalInputDevice;
pub use encoder::{encode_flac, linear_to_alaw, linear_to_ulaw, Encoder, EncodingError};

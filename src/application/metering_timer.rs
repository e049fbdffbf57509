//! Metering timer: samples input power while a capture is live

use std::ops::ControlFlow;

use crate::domain::capture::{normalize_power, METERING_INTERVAL};

use super::ports::MeteringCallback;
use super::timer::RepeatingTimer;

/// Source of input power for a metering timer
pub trait Meter: Send + 'static {
    /// Call `deliver` with the current power in dBFS if the capture is still
    /// live. Implementations hold their session lock while `deliver` runs so a
    /// tick can never land after the session stopped.
    ///
    /// # Returns
    /// `false` once the capture is gone; the timer then stops.
    fn read(&mut self, deliver: &mut dyn FnMut(f32)) -> bool;
}

/// Samples a [`Meter`] every 100 ms, appends the normalized level to the
/// running waveform and reports `(elapsed_secs, samples_so_far)`.
///
/// Dropping the timer cancels it.
pub struct MeteringTimer {
    _timer: RepeatingTimer,
}

impl MeteringTimer {
    /// Start sampling. Must be called from inside a tokio runtime.
    pub fn start<M: Meter>(mut meter: M, on_progress: MeteringCallback) -> Self {
        let mut samples: Vec<f32> = Vec::new();
        let timer = RepeatingTimer::start(METERING_INTERVAL, move |elapsed| {
            let live = meter.read(&mut |power| {
                samples.push(normalize_power(power));
                on_progress(elapsed.as_secs_f64(), samples.clone());
            });
            if live {
                ControlFlow::Continue(())
            } else {
                ControlFlow::Break(())
            }
        });
        Self { _timer: timer }
    }
}

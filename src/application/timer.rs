//! Repeating timer task shared by the metering and progress timers

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// A tokio task calling `on_tick` every `period` with the time elapsed since
/// the timer started. Dropping the timer aborts the task.
pub(crate) struct RepeatingTimer {
    handle: JoinHandle<()>,
}

impl RepeatingTimer {
    /// Start the timer. The first tick fires one period after start.
    /// Must be called from inside a tokio runtime.
    pub(crate) fn start<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(Duration) -> ControlFlow<()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = interval_at(started + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                let at = ticker.tick().await;
                if on_tick(at.duration_since(started)).is_break() {
                    break;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

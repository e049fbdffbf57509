//! Microphone permission by probing the input device
//!
//! Desktop platforms have no permission dialog cpal can trigger. Access counts
//! as granted once a default input device can be opened.

use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait};
use tracing::debug;

use crate::application::ports::{MicrophonePermission, PermissionStatus};

const UNDETERMINED: u8 = 0;
const GRANTED: u8 = 1;
const DENIED: u8 = 2;

fn encode(status: PermissionStatus) -> u8 {
    match status {
        PermissionStatus::Undetermined => UNDETERMINED,
        PermissionStatus::Granted => GRANTED,
        PermissionStatus::Denied => DENIED,
    }
}

fn decode(value: u8) -> PermissionStatus {
    match value {
        GRANTED => PermissionStatus::Granted,
        DENIED => PermissionStatus::Denied,
        _ => PermissionStatus::Undetermined,
    }
}

/// Grants access when the default input device responds
#[derive(Debug, Default)]
pub struct DeviceProbePermission {
    status: AtomicU8,
}

impl DeviceProbePermission {
    pub fn new() -> Self {
        Self::default()
    }

    fn probe() -> bool {
        let host = cpal::default_host();
        match host.default_input_device() {
            Some(device) => device.default_input_config().is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl MicrophonePermission for DeviceProbePermission {
    fn status(&self) -> PermissionStatus {
        decode(self.status.load(Ordering::SeqCst))
    }

    async fn request(&self) -> bool {
        let granted = tokio::task::spawn_blocking(Self::probe)
            .await
            .unwrap_or(false);
        let status = if granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        debug!(%status, "Probed default input device");
        self.status.store(encode(status), Ordering::SeqCst);
        granted
    }
}

/// A fixed answer, for front ends that manage access themselves
#[derive(Debug)]
pub struct StaticPermission {
    status: AtomicU8,
}

impl StaticPermission {
    pub fn new(status: PermissionStatus) -> Self {
        Self {
            status: AtomicU8::new(encode(status)),
        }
    }

    /// Always granted
    pub fn granted() -> Self {
        Self::new(PermissionStatus::Granted)
    }
}

#[async_trait]
impl MicrophonePermission for StaticPermission {
    fn status(&self) -> PermissionStatus {
        decode(self.status.load(Ordering::SeqCst))
    }

    async fn request(&self) -> bool {
        // Undetermined resolves to granted on first request
        if self.status() == PermissionStatus::Undetermined {
            self.status.store(GRANTED, Ordering::SeqCst);
        }
        self.status() == PermissionStatus::Granted
    }
}

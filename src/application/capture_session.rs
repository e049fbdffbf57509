//! Audio capture session
//!
//! Owns one recording lifecycle: permission, microphone activation, the
//! metering timer, and teardown. Sessions claim the microphone through a
//! [`CaptureRegistry`] so at most one of them records at a time.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::capture::CaptureSettings;

use super::metering_timer::{Meter, MeteringTimer};
use super::ports::{
    CaptureError, CaptureStream, InputDevice, MeteringCallback, MicrophonePermission,
    PermissionStatus,
};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Hardware state of a session. Every operation and every metering tick
/// takes this lock.
#[derive(Default)]
struct CaptureInner {
    stream: Option<Box<dyn CaptureStream>>,
    meter: Option<MeteringTimer>,
    destination: Option<PathBuf>,
    generation: u64,
}

impl CaptureInner {
    /// Cancel the sampler and deactivate the microphone. Idempotent.
    fn teardown(&mut self) -> bool {
        self.generation += 1;
        self.meter = None;
        self.destination = None;
        match self.stream.take() {
            Some(stream) => {
                stream.stop();
                true
            }
            None => false,
        }
    }
}

/// Reads the power of one specific capture run
struct SessionMeter {
    inner: Weak<Mutex<CaptureInner>>,
    generation: u64,
}

impl Meter for SessionMeter {
    fn read(&mut self, deliver: &mut dyn FnMut(f32)) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let inner = lock(&inner);
        if inner.generation != self.generation {
            return false;
        }
        match inner.stream.as_ref() {
            Some(stream) => {
                deliver(stream.average_power());
                true
            }
            None => false,
        }
    }
}

struct ActiveCapture {
    session_id: u64,
    inner: Weak<Mutex<CaptureInner>>,
}

/// Tracks which capture session holds the microphone
#[derive(Clone, Default)]
pub struct CaptureRegistry {
    active: Arc<Mutex<Option<ActiveCapture>>>,
}

impl CaptureRegistry {
    /// Create an isolated registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn shared() -> Self {
        static SHARED: OnceLock<CaptureRegistry> = OnceLock::new();
        SHARED.get_or_init(CaptureRegistry::new).clone()
    }

    /// Id of the session currently holding the microphone
    pub fn active_session(&self) -> Option<u64> {
        lock(&self.active).as_ref().map(|a| a.session_id)
    }

    /// Give the microphone to `session_id`, stopping whoever held it
    fn claim(&self, session_id: u64, inner: &Arc<Mutex<CaptureInner>>) {
        let mut active = lock(&self.active);
        if let Some(previous) = active.take() {
            if previous.session_id != session_id {
                if let Some(other) = previous.inner.upgrade() {
                    if lock(&other).teardown() {
                        warn!(
                            preempted = previous.session_id,
                            by = session_id,
                            "Stopped capture session to start another"
                        );
                    }
                }
            }
        }
        *active = Some(ActiveCapture {
            session_id,
            inner: Arc::downgrade(inner),
        });
    }

    fn release(&self, session_id: u64) {
        let mut active = lock(&self.active);
        if active.as_ref().is_some_and(|a| a.session_id == session_id) {
            *active = None;
        }
    }
}

/// A microphone recording session
pub struct AudioCaptureSession {
    id: u64,
    device: Arc<dyn InputDevice>,
    permission: Arc<dyn MicrophonePermission>,
    registry: CaptureRegistry,
    recordings_dir: PathBuf,
    inner: Arc<Mutex<CaptureInner>>,
    permission_gate: tokio::sync::Mutex<()>,
}

impl AudioCaptureSession {
    /// Create a session writing recordings into `recordings_dir`
    pub fn new(
        device: Arc<dyn InputDevice>,
        permission: Arc<dyn MicrophonePermission>,
        registry: CaptureRegistry,
        recordings_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            device,
            permission,
            registry,
            recordings_dir: recordings_dir.into(),
            inner: Arc::new(Mutex::new(CaptureInner::default())),
            permission_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Session id, unique within the process
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Directory recordings are written to
    pub fn recordings_dir(&self) -> &Path {
        &self.recordings_dir
    }

    /// Current microphone permission, without prompting
    pub fn permission_status(&self) -> PermissionStatus {
        self.permission.status()
    }

    /// Ask for microphone access.
    ///
    /// Only one request is in flight at a time; callers arriving while one is
    /// pending wait for it and reuse its answer.
    pub async fn request_permission(&self) -> bool {
        let _gate = self.permission_gate.lock().await;
        match self.permission.status() {
            PermissionStatus::Granted => true,
            PermissionStatus::Denied => false,
            PermissionStatus::Undetermined => {
                let granted = self.permission.request().await;
                info!(granted, "Microphone permission resolved");
                granted
            }
        }
    }

    /// Whether the microphone is capturing for this session
    pub fn is_recording(&self) -> bool {
        lock(&self.inner).stream.is_some()
    }

    /// File of the recording in progress
    pub fn destination(&self) -> Option<PathBuf> {
        lock(&self.inner).destination.clone()
    }

    /// Start recording.
    ///
    /// Validates the settings, activates the microphone and installs the
    /// metering timer. Returns the file the recording is written to; the file
    /// is complete once [`stop`](Self::stop) returns.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn start(
        &self,
        settings: &CaptureSettings,
        on_progress: MeteringCallback,
    ) -> Result<PathBuf, CaptureError> {
        let format = settings
            .format()
            .ok_or(CaptureError::UnsupportedFormat(settings.format_id))?;
        settings.validate()?;

        if self.permission.status() != PermissionStatus::Granted {
            return Err(CaptureError::PermissionDenied);
        }

        self.stop();
        self.registry.claim(self.id, &self.inner);

        let destination = self
            .recordings_dir
            .join(format!("{}{}", Uuid::new_v4(), format.extension()));

        match self.activate(settings, &destination, on_progress) {
            Ok(()) => {
                info!(
                    session = self.id,
                    format = %format,
                    path = %destination.display(),
                    "Recording started"
                );
                Ok(destination)
            }
            Err(e) => {
                warn!(session = self.id, error = %e, "Failed to start recording");
                self.stop();
                Err(e)
            }
        }
    }

    /// Request permission when needed, then [`start`](Self::start)
    pub async fn start_recording(
        &self,
        settings: &CaptureSettings,
        on_progress: MeteringCallback,
    ) -> Result<PathBuf, CaptureError> {
        if self.permission.status() != PermissionStatus::Granted && !self.request_permission().await
        {
            return Err(CaptureError::PermissionDenied);
        }
        self.start(settings, on_progress)
    }

    fn activate(
        &self,
        settings: &CaptureSettings,
        destination: &Path,
        on_progress: MeteringCallback,
    ) -> Result<(), CaptureError> {
        std::fs::create_dir_all(&self.recordings_dir).map_err(|e| {
            CaptureError::HardwareActivation(format!(
                "cannot create {}: {}",
                self.recordings_dir.display(),
                e
            ))
        })?;

        let stream = self.device.open(settings, destination)?;

        let mut inner = lock(&self.inner);
        inner.meter = None;
        inner.generation += 1;
        inner.stream = Some(stream);
        inner.destination = Some(destination.to_path_buf());
        let meter = SessionMeter {
            inner: Arc::downgrade(&self.inner),
            generation: inner.generation,
        };
        inner.meter = Some(MeteringTimer::start(meter, on_progress));
        Ok(())
    }

    /// Stop recording. Safe to call when not recording.
    ///
    /// Once this returns no further metering tick is delivered.
    pub fn stop(&self) {
        let stopped = lock(&self.inner).teardown();
        self.registry.release(self.id);
        if stopped {
            info!(session = self.id, "Recording stopped");
        } else {
            debug!(session = self.id, "Stop requested while idle");
        }
    }
}

impl Drop for AudioCaptureSession {
    fn drop(&mut self) {
        lock(&self.inner).teardown();
        self.registry.release(self.id);
    }
}

//! Audio playback session
//!
//! Plays one recording at a time, reports progress every 200 ms and pauses
//! itself when another session on the same [`PlaybackRegistry`] starts playing.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::recording::RecordingArtifact;

use super::ports::{OutputDevice, PlayerHandle};
use super::timer::RepeatingTimer;

/// Progress poll cadence
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Observable playback values
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PlaybackProgress {
    pub playing: bool,
    /// Seconds
    pub duration: f64,
    /// Fraction of the recording played, 0 when the duration is unknown
    pub progress: f64,
    pub seconds_left: u64,
}

/// Notifications from a playback session
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Progress(PlaybackProgress),
    /// The recording reached its end. Sent once per playback run.
    PlayedToEnd,
}

/// Receives [`PlaybackEvent`]s. Called with the session lock held, so it must
/// not call back into the session.
pub type PlaybackListener = Arc<dyn Fn(PlaybackEvent) + Send + Sync>;

/// Broadcasts "started playing" announcements between playback sessions
#[derive(Clone)]
pub struct PlaybackRegistry {
    started: broadcast::Sender<u64>,
}

impl PlaybackRegistry {
    pub fn new() -> Self {
        let (started, _) = broadcast::channel(16);
        Self { started }
    }

    /// The process-wide registry
    pub fn shared() -> Self {
        static SHARED: OnceLock<PlaybackRegistry> = OnceLock::new();
        SHARED.get_or_init(PlaybackRegistry::new).clone()
    }

    fn announce(&self, session_id: u64) {
        // No receivers just means no other session is alive
        let _ = self.started.send(session_id);
    }

    fn subscribe(&self) -> broadcast::Receiver<u64> {
        self.started.subscribe()
    }
}

impl Default for PlaybackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Default)]
struct PlaybackInner {
    loaded: Option<PathBuf>,
    player: Option<Box<dyn PlayerHandle>>,
    playing: bool,
    progress: PlaybackProgress,
    ticker: Option<RepeatingTimer>,
    observer: Option<TaskGuard>,
    generation: u64,
    listener: Option<PlaybackListener>,
}

impl PlaybackInner {
    fn emit(&self, event: PlaybackEvent) {
        if let Some(listener) = &self.listener {
            listener(event);
        }
    }

    fn emit_progress(&self) {
        self.emit(PlaybackEvent::Progress(self.progress));
    }

    fn refresh_progress(&mut self) {
        let Some(player) = self.player.as_ref() else {
            self.progress = PlaybackProgress::default();
            return;
        };
        let duration = player.duration().as_secs_f64();
        let current = player.current_time().as_secs_f64();
        self.progress = PlaybackProgress {
            playing: self.playing,
            duration,
            progress: if duration > 0.0 { current / duration } else { 0.0 },
            seconds_left: (duration - current).max(0.0).round() as u64,
        };
    }

    /// Pause hardware and cancel the progress timer
    fn halt(&mut self) -> bool {
        self.generation += 1;
        self.ticker = None;
        if !self.playing {
            return false;
        }
        self.playing = false;
        if let Some(player) = self.player.as_mut() {
            player.pause();
        }
        true
    }

    /// Forget the loaded recording
    fn unload(&mut self) {
        self.halt();
        self.observer = None;
        self.player = None;
        self.loaded = None;
        self.progress = PlaybackProgress::default();
    }

    fn tick(&mut self) -> ControlFlow<()> {
        let Some(player) = self.player.as_ref() else {
            return ControlFlow::Break(());
        };
        let finished = !player.is_playing();
        if finished {
            self.playing = false;
            self.ticker = None;
        }
        self.refresh_progress();
        self.emit_progress();
        if finished {
            debug!(path = ?self.loaded, "Playback reached the end");
            self.emit(PlaybackEvent::PlayedToEnd);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

/// A recording player
pub struct AudioPlaybackSession {
    id: u64,
    device: Arc<dyn OutputDevice>,
    registry: PlaybackRegistry,
    inner: Arc<Mutex<PlaybackInner>>,
}

impl AudioPlaybackSession {
    pub fn new(device: Arc<dyn OutputDevice>, registry: PlaybackRegistry) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            device,
            registry,
            inner: Arc::new(Mutex::new(PlaybackInner::default())),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Register the receiver of progress and end-of-playback events
    pub fn set_listener(&self, listener: PlaybackListener) {
        lock(&self.inner).listener = Some(listener);
    }

    pub fn progress(&self) -> PlaybackProgress {
        lock(&self.inner).progress
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.inner).playing
    }

    /// File of the loaded recording
    pub fn loaded_url(&self) -> Option<PathBuf> {
        lock(&self.inner).loaded.clone()
    }

    /// Play a recording, loading it first when another one is loaded.
    ///
    /// # Returns
    /// `true` when playback is running. A recording without a file or one that
    /// fails to load leaves the session idle.
    pub fn play(&self, artifact: &RecordingArtifact) -> bool {
        let Some(url) = artifact.url() else {
            debug!("Play requested for a recording without a file");
            return false;
        };

        let mut inner = lock(&self.inner);
        if !self.ensure_loaded(&mut inner, url) {
            return false;
        }
        if !inner.playing {
            self.resume(&mut inner);
        }
        drop(inner);

        self.registry.announce(self.id);
        true
    }

    /// Pause playback. No-op when not playing.
    pub fn pause(&self) {
        let mut inner = lock(&self.inner);
        if inner.halt() {
            inner.refresh_progress();
            inner.emit_progress();
            debug!(session = self.id, "Playback paused");
        }
    }

    /// Pause when this recording is playing, play it otherwise
    pub fn toggle_play(&self, artifact: &RecordingArtifact) -> bool {
        let playing_this = {
            let inner = lock(&self.inner);
            inner.playing && artifact.url().is_some_and(|u| inner.loaded.as_deref() == Some(u))
        };
        if playing_this {
            self.pause();
            false
        } else {
            self.play(artifact)
        }
    }

    /// Move to `fraction` of the recording and make sure it is playing.
    ///
    /// The position is `artifact.duration() * fraction`, with `fraction`
    /// clamped to `[0, 1]`.
    pub fn seek(&self, artifact: &RecordingArtifact, fraction: f64) -> bool {
        let Some(url) = artifact.url() else {
            return false;
        };
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let goal =
            Duration::try_from_secs_f64((artifact.duration() * fraction).max(0.0)).unwrap_or_default();

        let mut inner = lock(&self.inner);
        if !self.ensure_loaded(&mut inner, url) {
            return false;
        }
        let Some(player) = inner.player.as_mut() else {
            return false;
        };
        if let Err(e) = player.seek(goal) {
            warn!(error = %e, "Seek failed");
            return false;
        }

        let announce = !inner.playing;
        if announce {
            self.resume(&mut inner);
        } else {
            inner.refresh_progress();
            inner.emit_progress();
        }
        drop(inner);

        if announce {
            self.registry.announce(self.id);
        }
        true
    }

    /// Stop and unload. Progress goes back to zero.
    pub fn reset(&self) {
        let mut inner = lock(&self.inner);
        if inner.loaded.is_none() {
            return;
        }
        inner.unload();
        inner.emit_progress();
        debug!(session = self.id, "Playback reset");
    }

    fn ensure_loaded(&self, inner: &mut PlaybackInner, url: &Path) -> bool {
        if inner.player.is_some() && inner.loaded.as_deref() == Some(url) {
            return true;
        }
        inner.unload();

        match self.device.load(url) {
            Ok(player) => {
                info!(session = self.id, path = %url.display(), "Loaded recording");
                inner.player = Some(player);
                inner.loaded = Some(url.to_path_buf());
                inner.observer = Some(self.observe_others());
                inner.refresh_progress();
                true
            }
            Err(e) => {
                warn!(session = self.id, path = %url.display(), error = %e, "Failed to load recording");
                false
            }
        }
    }

    fn resume(&self, inner: &mut PlaybackInner) {
        let Some(player) = inner.player.as_mut() else {
            return;
        };
        player.play();
        inner.playing = true;
        inner.generation += 1;

        let generation = inner.generation;
        let weak = Arc::downgrade(&self.inner);
        inner.ticker = Some(RepeatingTimer::start(PROGRESS_INTERVAL, move |_| {
            let Some(inner) = weak.upgrade() else {
                return ControlFlow::Break(());
            };
            let mut inner = lock(&inner);
            if inner.generation != generation {
                return ControlFlow::Break(());
            }
            inner.tick()
        }));

        inner.refresh_progress();
        inner.emit_progress();
    }

    /// Pause this session whenever another one announces it started
    fn observe_others(&self) -> TaskGuard {
        let mut started = self.registry.subscribe();
        let inner: Weak<Mutex<PlaybackInner>> = Arc::downgrade(&self.inner);
        let id = self.id;
        TaskGuard(tokio::spawn(async move {
            loop {
                match started.recv().await {
                    Ok(other) if other != id => {
                        let Some(inner) = inner.upgrade() else {
                            break;
                        };
                        let mut inner = lock(&inner);
                        if inner.halt() {
                            inner.refresh_progress();
                            inner.emit_progress();
                            debug!(session = id, by = other, "Paused for another session");
                        }
                    }
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    }
}

impl Drop for AudioPlaybackSession {
    fn drop(&mut self) {
        lock(&self.inner).unload();
    }
}

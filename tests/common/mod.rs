//! In-memory devices for driving the composer without audio hardware

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use chat_composer::application::ports::{
    CaptureError, CaptureStream, DraftSender, InputDevice, MicrophonePermission, OutputDevice,
    PermissionStatus, PlaybackError, PlayerHandle, Transcriber, TranscriptionError,
};
use chat_composer::application::{
    AudioCaptureSession, AudioPlaybackSession, CaptureRegistry, InputViewModel, PlaybackRegistry,
};
use chat_composer::domain::capture::{AudioFormat, CaptureSettings};
use chat_composer::domain::composer::DraftMessage;

/// Length of every clip the fake speaker loads
pub const CLIP_LENGTH: Duration = Duration::from_millis(300);

/// Time the fake encoder spends before the file appears
pub const ENCODE_TIME: Duration = Duration::from_millis(30);

/// Bytes of every recording the fake microphone writes
pub const RECORDED_BYTES: &[u8] = b"RIFF fake voice message";

/// Microphone reporting a constant -30 dBFS.
///
/// Like the cpal adapter, nothing is written until the capture is stopped.
#[derive(Default)]
pub struct FakeMicrophone {
    pub opened: Mutex<Vec<PathBuf>>,
    pub fail: bool,
}

struct FakeStream {
    destination: PathBuf,
}

impl CaptureStream for FakeStream {
    fn average_power(&self) -> f32 {
        -30.0
    }

    fn stop(self: Box<Self>) {
        std::thread::sleep(ENCODE_TIME);
        std::fs::write(&self.destination, RECORDED_BYTES).unwrap();
    }
}

impl InputDevice for FakeMicrophone {
    fn open(
        &self,
        _settings: &CaptureSettings,
        destination: &Path,
    ) -> Result<Box<dyn CaptureStream>, CaptureError> {
        if self.fail {
            return Err(CaptureError::HardwareActivation("microphone busy".into()));
        }
        self.opened.lock().unwrap().push(destination.to_path_buf());
        Ok(Box::new(FakeStream {
            destination: destination.to_path_buf(),
        }))
    }
}

/// Permission prompt answered after 20 ms
pub struct FakePermission {
    status: Mutex<PermissionStatus>,
    answer: bool,
    pub prompts: AtomicUsize,
}

impl FakePermission {
    pub fn new(status: PermissionStatus, answer: bool) -> Self {
        Self {
            status: Mutex::new(status),
            answer,
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn granted() -> Self {
        Self::new(PermissionStatus::Granted, true)
    }
}

#[async_trait]
impl MicrophonePermission for FakePermission {
    fn status(&self) -> PermissionStatus {
        *self.status.lock().unwrap()
    }

    async fn request(&self) -> bool {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        *self.status.lock().unwrap() = if self.answer {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        self.answer
    }
}

/// Player whose play head follows the tokio clock
pub struct FakePlayer {
    base: Duration,
    started: Option<Instant>,
}

impl FakePlayer {
    fn position(&self) -> Duration {
        let run = self.started.map(|s| s.elapsed()).unwrap_or_default();
        (self.base + run).min(CLIP_LENGTH)
    }
}

impl PlayerHandle for FakePlayer {
    fn play(&mut self) {
        if self.position() >= CLIP_LENGTH {
            self.base = Duration::ZERO;
            self.started = None;
        }
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.base = self.position();
        self.started = None;
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        self.base = position.min(CLIP_LENGTH);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
        Ok(())
    }

    fn current_time(&self) -> Duration {
        self.position()
    }

    fn duration(&self) -> Duration {
        CLIP_LENGTH
    }

    fn is_playing(&self) -> bool {
        self.started.is_some() && self.position() < CLIP_LENGTH
    }
}

/// Plays only complete recordings
#[derive(Default)]
pub struct FakeSpeaker {
    pub loads: AtomicUsize,
}

impl OutputDevice for FakeSpeaker {
    fn load(&self, path: &Path) -> Result<Box<dyn PlayerHandle>, PlaybackError> {
        let audio = std::fs::read(path).map_err(|e| PlaybackError::LoadFailed(e.to_string()))?;
        if audio != RECORDED_BYTES {
            return Err(PlaybackError::LoadFailed("incomplete recording".into()));
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePlayer {
            base: Duration::ZERO,
            started: None,
        }))
    }
}

/// Keeps every draft handed over for sending
#[derive(Default)]
pub struct CollectingSender {
    pub drafts: Mutex<Vec<DraftMessage>>,
}

impl CollectingSender {
    pub fn sent(&self) -> Vec<DraftMessage> {
        self.drafts.lock().unwrap().clone()
    }
}

impl DraftSender for CollectingSender {
    fn on_draft_ready(&self, draft: DraftMessage) {
        self.drafts.lock().unwrap().push(draft);
    }
}

/// Reads the recording, then answers with a fixed text or fails
pub struct FakeTranscriber {
    text: Option<String>,
    pub calls: Mutex<Vec<PathBuf>>,
}

impl FakeTranscriber {
    pub fn answering(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            text: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, recording: &Path) -> Result<String, TranscriptionError> {
        self.calls.lock().unwrap().push(recording.to_path_buf());
        let audio = std::fs::read(recording)
            .map_err(|e| TranscriptionError::ReadFailed(e.to_string()))?;
        if audio.is_empty() {
            return Err(TranscriptionError::ReadFailed("empty recording".into()));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.text.clone().ok_or(TranscriptionError::EmptyResponse)
    }
}

/// A view model wired to in-memory devices
pub struct Harness {
    pub vm: InputViewModel,
    pub recorder: Arc<AudioCaptureSession>,
    pub player: Arc<AudioPlaybackSession>,
    pub microphone: Arc<FakeMicrophone>,
    pub permission: Arc<FakePermission>,
    pub speaker: Arc<FakeSpeaker>,
    pub sender: Arc<CollectingSender>,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(FakeMicrophone::default(), FakePermission::granted(), None)
    }

    pub fn with(
        microphone: FakeMicrophone,
        permission: FakePermission,
        transcriber: Option<FakeTranscriber>,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let microphone = Arc::new(microphone);
        let permission = Arc::new(permission);
        let speaker = Arc::new(FakeSpeaker::default());
        let sender = Arc::new(CollectingSender::default());

        let recorder = Arc::new(AudioCaptureSession::new(
            microphone.clone(),
            permission.clone(),
            CaptureRegistry::new(),
            dir.path(),
        ));
        let player = Arc::new(AudioPlaybackSession::new(
            speaker.clone(),
            PlaybackRegistry::new(),
        ));

        let mut vm = InputViewModel::new(
            Arc::clone(&recorder),
            Arc::clone(&player),
            sender.clone(),
            CaptureSettings::new(AudioFormat::Aac),
        );
        if let Some(transcriber) = transcriber {
            vm = vm.with_transcriber(Arc::new(transcriber));
        }

        Self {
            vm,
            recorder,
            player,
            microphone,
            permission,
            speaker,
            sender,
            dir,
        }
    }

    /// Wait for the next queued event and apply it
    pub async fn step(&mut self) {
        let event = self.vm.next_event().await.expect("event queue closed");
        self.vm.handle_event(event);
    }
}

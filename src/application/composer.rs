//! Input view model
//!
//! The composer's state machine. It turns user actions into calls on the
//! capture and playback sessions, folds their results back in through an
//! event queue and publishes an [`InputSnapshot`] after every change.
//!
//! All mutation goes through `&mut self` on the task that owns the view model.
//! Timer callbacks and async results only enqueue [`ComposerEvent`]s; they are
//! applied by [`InputViewModel::handle_event`] on the owner's task.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::capture::CaptureSettings;
use crate::domain::composer::{
    DraftMessage, InputAction, InputAttachments, InputState, Media, MediaPickerMode, ReplyMessage,
};
use crate::domain::recording::RecordingArtifact;

use super::capture_session::AudioCaptureSession;
use super::playback_session::{AudioPlaybackSession, PlaybackEvent, PlaybackProgress};
use super::ports::{CaptureError, DraftSender, MeteringCallback, PermissionStatus, Transcriber};

/// Callback stashed by [`InputViewModel::edit`], called with the edited text
pub type EditCallback = Box<dyn FnOnce(String) + Send>;

/// Results delivered to the view model from timers and background tasks.
///
/// Recording related events carry the recording token they were issued for;
/// events from a discarded recording are ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposerEvent {
    RecordingProgress {
        token: u64,
        elapsed: f64,
        samples: Vec<f32>,
    },
    PermissionResolved {
        token: u64,
        granted: bool,
    },
    Playback(PlaybackEvent),
    TranscriptionFinished {
        token: u64,
        text: Option<String>,
    },
}

/// What the rendering layer sees
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub state: InputState,
    pub text: String,
    pub media_count: usize,
    pub recording: Option<RecordingArtifact>,
    pub playback: PlaybackProgress,
    pub is_transcribing: bool,
    pub can_send: bool,
    pub show_picker: bool,
    pub picker_mode: MediaPickerMode,
    pub last_error: Option<CaptureError>,
}

/// Message composer state machine
pub struct InputViewModel {
    state: InputState,
    attachments: InputAttachments,
    show_picker: bool,
    picker_mode: MediaPickerMode,
    is_transcribing: bool,
    playback: PlaybackProgress,
    last_error: Option<CaptureError>,

    recorder: Arc<AudioCaptureSession>,
    player: Arc<AudioPlaybackSession>,
    settings: CaptureSettings,
    transcriber: Option<Arc<dyn Transcriber>>,
    sender: Arc<dyn DraftSender>,
    edit_callback: Option<EditCallback>,

    recording_token: u64,
    events_tx: mpsc::UnboundedSender<ComposerEvent>,
    events_rx: mpsc::UnboundedReceiver<ComposerEvent>,
    snapshots: watch::Sender<InputSnapshot>,
}

impl InputViewModel {
    /// Create a view model in the `Empty` state.
    ///
    /// Registers itself as the player's listener.
    pub fn new(
        recorder: Arc<AudioCaptureSession>,
        player: Arc<AudioPlaybackSession>,
        sender: Arc<dyn DraftSender>,
        settings: CaptureSettings,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(InputSnapshot::default());

        let tx = events_tx.clone();
        player.set_listener(Arc::new(move |event| {
            let _ = tx.send(ComposerEvent::Playback(event));
        }));

        Self {
            state: InputState::Empty,
            attachments: InputAttachments::default(),
            show_picker: false,
            picker_mode: MediaPickerMode::default(),
            is_transcribing: false,
            playback: PlaybackProgress::default(),
            last_error: None,
            recorder,
            player,
            settings,
            transcriber: None,
            sender,
            edit_callback: None,
            recording_token: 0,
            events_tx,
            events_rx,
            snapshots,
        }
    }

    /// Transcribe text-less voice messages on send instead of sending them
    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    // --- observation ---

    /// Receive a snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<InputSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            state: self.state,
            text: self.attachments.text.clone(),
            media_count: self.attachments.medias.len(),
            recording: self.attachments.recording.clone(),
            playback: self.playback,
            is_transcribing: self.is_transcribing,
            can_send: self.can_send(),
            show_picker: self.show_picker,
            picker_mode: self.picker_mode,
            last_error: self.last_error.clone(),
        }
    }

    pub fn state(&self) -> InputState {
        self.state
    }

    pub fn attachments(&self) -> &InputAttachments {
        &self.attachments
    }

    pub fn can_send(&self) -> bool {
        self.state.can_send() && !self.is_transcribing
    }

    pub fn is_transcribing(&self) -> bool {
        self.is_transcribing
    }

    pub fn playback(&self) -> PlaybackProgress {
        self.playback
    }

    /// Last capture failure, cleared when a recording starts
    pub fn last_error(&self) -> Option<&CaptureError> {
        self.last_error.as_ref()
    }

    pub fn show_picker(&self) -> bool {
        self.show_picker
    }

    pub fn picker_mode(&self) -> MediaPickerMode {
        self.picker_mode
    }

    // --- composition ---

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.attachments.text = text.into();
        self.validate_draft();
        self.publish();
    }

    pub fn add_media(&mut self, media: Media) {
        self.attachments.medias.push(media);
        self.show_picker = false;
        self.validate_draft();
        self.publish();
    }

    /// Remove a picked media item. Returns whether it was attached.
    pub fn remove_media(&mut self, id: Uuid) -> bool {
        let before = self.attachments.medias.len();
        self.attachments.medias.retain(|m| m.id != id);
        let removed = self.attachments.medias.len() != before;
        if removed {
            self.validate_draft();
            self.publish();
        }
        removed
    }

    pub fn set_reply_message(&mut self, reply: Option<ReplyMessage>) {
        self.attachments.reply_message = reply;
        self.publish();
    }

    pub fn dismiss_picker(&mut self) {
        self.show_picker = false;
        self.publish();
    }

    /// Enter the editing state for `text`. `on_save` runs on [`InputAction::SaveEdit`]
    /// with the text as it is then.
    pub fn edit(&mut self, text: impl Into<String>, on_save: impl FnOnce(String) + Send + 'static) {
        self.recorder.stop();
        self.player.reset();
        self.attachments.text = text.into();
        self.edit_callback = Some(Box::new(on_save));
        self.state = InputState::Editing;
        self.publish();
    }

    /// Play the recording from `fraction` of its length
    pub fn seek_record(&mut self, fraction: f64) {
        if !matches!(
            self.state,
            InputState::HasRecording | InputState::Playing | InputState::Paused
        ) {
            return;
        }
        let Some(recording) = self.attachments.recording.as_ref() else {
            return;
        };
        if self.player.seek(recording, fraction) {
            self.state = InputState::Playing;
        }
        self.publish();
    }

    // --- actions ---

    /// Apply a user action
    pub fn perform(&mut self, action: InputAction) {
        debug!(action = %action, state = %self.state, "Input action");
        match action {
            InputAction::Photo => {
                self.picker_mode = MediaPickerMode::Photos;
                self.show_picker = true;
            }
            InputAction::Add => self.picker_mode = MediaPickerMode::Camera,
            InputAction::Camera => {
                self.picker_mode = MediaPickerMode::Camera;
                self.show_picker = true;
            }
            InputAction::Send => self.send(),
            InputAction::RecordAudioHold => self.record(InputState::RecordingHeld),
            InputAction::RecordAudioTap => self.record(InputState::RecordingTapped),
            InputAction::RecordAudioLock => {
                debug!("Locking a held recording is not supported yet");
            }
            InputAction::StopRecordAudio => self.stop_recording(),
            InputAction::DeleteRecord => self.delete_record(),
            InputAction::PlayRecord => self.play_record(),
            InputAction::PauseRecord => self.pause_record(),
            InputAction::SaveEdit => {
                if self.state == InputState::Editing {
                    if let Some(on_save) = self.edit_callback.take() {
                        on_save(self.attachments.text.clone());
                    }
                    self.reset();
                }
            }
            InputAction::CancelEdit => {
                if self.state == InputState::Editing {
                    self.reset();
                }
            }
        }
        self.publish();
    }

    // --- events ---

    /// Apply one queued result
    pub fn handle_event(&mut self, event: ComposerEvent) {
        self.apply(event);
        self.publish();
    }

    /// Apply every queued result without waiting
    pub fn process_pending_events(&mut self) {
        self.drain_events();
        self.publish();
    }

    /// Wait for the next queued result. Pass it to [`handle_event`](Self::handle_event).
    ///
    /// Cancel safe.
    pub async fn next_event(&mut self) -> Option<ComposerEvent> {
        self.events_rx.recv().await
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: ComposerEvent) {
        match event {
            ComposerEvent::RecordingProgress {
                token,
                elapsed,
                samples,
            } => {
                if token != self.recording_token {
                    return;
                }
                if let Some(recording) = self.attachments.recording.as_mut() {
                    recording.update(elapsed, samples);
                }
            }
            ComposerEvent::PermissionResolved { token, granted } => {
                if token != self.recording_token || self.state != InputState::WaitingPermission {
                    return;
                }
                if granted {
                    self.state = InputState::RecordingTapped;
                    self.begin_capture();
                } else {
                    info!("Microphone permission denied");
                    self.last_error = Some(CaptureError::PermissionDenied);
                }
            }
            ComposerEvent::Playback(PlaybackEvent::Progress(progress)) => {
                self.playback = progress;
                if self.state == InputState::Playing && !self.player.is_playing() {
                    self.state = InputState::Paused;
                }
            }
            ComposerEvent::Playback(PlaybackEvent::PlayedToEnd) => {
                if matches!(self.state, InputState::Playing | InputState::Paused)
                    && self.attachments.recording.is_some()
                    && !self.player.is_playing()
                {
                    self.state = InputState::HasRecording;
                }
            }
            ComposerEvent::TranscriptionFinished { token, text } => {
                self.is_transcribing = false;
                if token != self.recording_token {
                    debug!("Dropping transcript of a discarded recording");
                    return;
                }
                self.attachments.text = text.unwrap_or_default();
                self.attachments.recording = None;
                self.recording_token += 1;
                self.state = InputState::Empty;
                self.validate_draft();
            }
        }
    }

    fn record(&mut self, target: InputState) {
        if self.state.is_recording() || self.awaiting_permission() {
            debug!(state = %self.state, "Recording already in progress");
            return;
        }
        if self.edit_callback.take().is_some() {
            debug!("Leaving edit mode to record");
        }

        let permission = self.recorder.permission_status();
        let granted = permission == PermissionStatus::Granted;
        self.state = if granted {
            target
        } else {
            InputState::WaitingPermission
        };

        self.player.reset();
        self.recording_token += 1;
        self.attachments.recording = Some(RecordingArtifact::new());

        if granted {
            self.begin_capture();
            return;
        }

        self.last_error = None;
        let recorder = Arc::clone(&self.recorder);
        let tx = self.events_tx.clone();
        let token = self.recording_token;
        debug!(status = %permission, "Requesting microphone permission");
        tokio::spawn(async move {
            let granted = recorder.request_permission().await;
            let _ = tx.send(ComposerEvent::PermissionResolved { token, granted });
        });
    }

    /// A permission prompt is open. After a denial the user may tap again.
    fn awaiting_permission(&self) -> bool {
        self.state == InputState::WaitingPermission
            && self.last_error != Some(CaptureError::PermissionDenied)
    }

    fn begin_capture(&mut self) {
        let token = self.recording_token;
        let tx = self.events_tx.clone();
        let on_progress: MeteringCallback = Arc::new(move |elapsed, samples| {
            let _ = tx.send(ComposerEvent::RecordingProgress {
                token,
                elapsed,
                samples,
            });
        });

        match self.recorder.start(&self.settings, on_progress) {
            Ok(path) => {
                self.last_error = None;
                if let Some(recording) = self.attachments.recording.as_mut() {
                    recording.set_url(path);
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not start recording");
                self.last_error = Some(e);
                self.recording_token += 1;
                self.attachments.recording = None;
                self.state = InputState::Empty;
                self.validate_draft();
            }
        }
    }

    fn stop_recording(&mut self) {
        match self.state {
            InputState::RecordingHeld | InputState::RecordingTapped => {
                self.recorder.stop();
                self.drain_events();
                self.state = InputState::HasRecording;
                self.player.reset();
                if let Some(recording) = &self.attachments.recording {
                    info!(duration = recording.duration(), "Recording finished");
                }
            }
            InputState::WaitingPermission => {
                self.recording_token += 1;
                self.attachments.recording = None;
                self.state = InputState::Empty;
                self.validate_draft();
            }
            _ => {}
        }
    }

    fn delete_record(&mut self) {
        if self.state == InputState::Editing {
            return;
        }
        self.player.reset();
        self.recorder.stop();
        self.recording_token += 1;
        self.attachments.recording = None;
        self.state = InputState::Empty;
        self.validate_draft();
    }

    fn play_record(&mut self) {
        if !matches!(self.state, InputState::HasRecording | InputState::Paused) {
            return;
        }
        let Some(recording) = self.attachments.recording.as_ref() else {
            return;
        };
        if self.player.play(recording) {
            self.state = InputState::Playing;
        }
    }

    fn pause_record(&mut self) {
        if self.state == InputState::Playing {
            self.player.pause();
            self.state = InputState::Paused;
        }
    }

    fn send(&mut self) {
        if !self.can_send() {
            return;
        }

        self.recorder.stop();
        self.drain_events();
        self.player.reset();
        if self.state.is_recording() {
            self.state = InputState::HasRecording;
        }

        let voice_only = self.attachments.text.is_empty();
        let recording_url = self
            .attachments
            .recording
            .as_ref()
            .and_then(|r| r.url())
            .map(|u| u.to_path_buf());

        if let (true, Some(path), Some(transcriber)) =
            (voice_only, recording_url, self.transcriber.clone())
        {
            self.is_transcribing = true;
            let tx = self.events_tx.clone();
            let token = self.recording_token;
            info!(path = %path.display(), "Transcribing voice message");
            tokio::spawn(async move {
                let text = match transcriber.transcribe(&path).await {
                    Ok(text) => Some(text),
                    Err(e) => {
                        warn!(error = %e, "Transcription failed");
                        None
                    }
                };
                let _ = tx.send(ComposerEvent::TranscriptionFinished { token, text });
            });
            return;
        }

        let draft = DraftMessage::from_attachments(std::mem::take(&mut self.attachments));
        info!(
            id = %draft.id,
            media = draft.medias.len(),
            voice = draft.recording.is_some(),
            "Draft ready"
        );
        self.sender.on_draft_ready(draft);
        self.reset();
    }

    /// Back to an empty composer
    fn reset(&mut self) {
        self.recorder.stop();
        self.player.reset();
        self.recording_token += 1;
        self.attachments = InputAttachments::default();
        self.show_picker = false;
        self.picker_mode = MediaPickerMode::default();
        self.edit_callback = None;
        self.state = InputState::Empty;
    }

    /// Re-evaluate Empty/HasContent after the draft changed
    fn validate_draft(&mut self) {
        if self.state == InputState::Editing {
            return;
        }
        if self.state.is_recording_related() && self.attachments.recording.is_some() {
            return;
        }
        self.state = if self.attachments.has_text_or_media() {
            InputState::HasContent
        } else {
            InputState::Empty
        };
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}

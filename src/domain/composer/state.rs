//! Input state and user actions of the message composer

use std::fmt;

/// Composer states. Exactly one is active at a time.
///
/// State machine:
///   EMPTY <-> HAS_CONTENT (text/media edits)
///   EMPTY/HAS_CONTENT -> WAITING_PERMISSION | RECORDING_TAPPED | RECORDING_HELD (record)
///   WAITING_PERMISSION -> RECORDING_TAPPED (permission granted)
///   RECORDING_* -> HAS_RECORDING (stop)
///   HAS_RECORDING/PAUSED -> PLAYING (play), PLAYING -> PAUSED (pause)
///   PLAYING/PAUSED -> HAS_RECORDING (played to end)
///   recording states -> EMPTY (delete)
///   any -> EDITING (edit), EDITING -> EMPTY (save/cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputState {
    #[default]
    Empty,
    HasContent,
    WaitingPermission,
    RecordingHeld,
    RecordingTapped,
    HasRecording,
    Playing,
    Paused,
    Editing,
}

impl InputState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::HasContent => "has-content",
            Self::WaitingPermission => "waiting-permission",
            Self::RecordingHeld => "recording-held",
            Self::RecordingTapped => "recording-tapped",
            Self::HasRecording => "has-recording",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Editing => "editing",
        }
    }

    /// Whether a send action is accepted in this state
    pub const fn can_send(&self) -> bool {
        matches!(
            self,
            Self::HasContent | Self::HasRecording | Self::RecordingTapped | Self::Playing | Self::Paused
        )
    }

    /// Whether the microphone is capturing in this state
    pub const fn is_recording(&self) -> bool {
        matches!(self, Self::RecordingHeld | Self::RecordingTapped)
    }

    /// Whether the state is part of the voice message flow
    pub const fn is_recording_related(&self) -> bool {
        matches!(
            self,
            Self::WaitingPermission
                | Self::RecordingHeld
                | Self::RecordingTapped
                | Self::HasRecording
                | Self::Playing
                | Self::Paused
        )
    }
}

impl fmt::Display for InputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User intents delivered by the input bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Photo,
    Add,
    Camera,
    Send,
    RecordAudioHold,
    RecordAudioTap,
    RecordAudioLock,
    StopRecordAudio,
    DeleteRecord,
    PlayRecord,
    PauseRecord,
    SaveEdit,
    CancelEdit,
}

impl InputAction {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Add => "add",
            Self::Camera => "camera",
            Self::Send => "send",
            Self::RecordAudioHold => "record-hold",
            Self::RecordAudioTap => "record-tap",
            Self::RecordAudioLock => "record-lock",
            Self::StopRecordAudio => "stop",
            Self::DeleteRecord => "delete",
            Self::PlayRecord => "play",
            Self::PauseRecord => "pause",
            Self::SaveEdit => "save",
            Self::CancelEdit => "cancel",
        }
    }
}

impl fmt::Display for InputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which picker the attachment button opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaPickerMode {
    #[default]
    Photos,
    Camera,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_empty() {
        assert_eq!(InputState::default(), InputState::Empty);
    }

    #[test]
    fn send_eligible_states() {
        let eligible = [
            InputState::HasContent,
            InputState::HasRecording,
            InputState::RecordingTapped,
            InputState::Playing,
            InputState::Paused,
        ];
        let ineligible = [
            InputState::Empty,
            InputState::WaitingPermission,
            InputState::RecordingHeld,
            InputState::Editing,
        ];
        assert!(eligible.iter().all(|s| s.can_send()));
        assert!(ineligible.iter().all(|s| !s.can_send()));
    }

    #[test]
    fn recording_states() {
        assert!(InputState::RecordingHeld.is_recording());
        assert!(InputState::RecordingTapped.is_recording());
        assert!(!InputState::HasRecording.is_recording());
        assert!(InputState::HasRecording.is_recording_related());
        assert!(!InputState::HasContent.is_recording_related());
    }

    #[test]
    fn state_display() {
        assert_eq!(InputState::WaitingPermission.to_string(), "waiting-permission");
        assert_eq!(InputState::HasContent.to_string(), "has-content");
    }
}

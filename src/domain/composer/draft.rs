//! Draft message and attachment value objects

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::recording::RecordingArtifact;

/// Kind of picked media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Guess the kind from a file extension, defaulting to image
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("mp4" | "mov" | "m4v" | "webm" | "mkv") => Self::Video,
            _ => Self::Image,
        }
    }
}

/// A picked photo or video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Media {
    pub id: Uuid,
    pub kind: MediaKind,
    pub url: PathBuf,
}

impl Media {
    pub fn new(kind: MediaKind, url: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            url: url.into(),
        }
    }

    /// Media for a file, kind inferred from its extension
    pub fn from_path(url: impl Into<PathBuf>) -> Self {
        let url = url.into();
        Self::new(MediaKind::from_path(&url), url)
    }
}

/// The message being replied to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyMessage {
    pub id: String,
    pub author: String,
    pub text: String,
}

/// Everything attached to the draft currently being composed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputAttachments {
    pub text: String,
    pub medias: Vec<Media>,
    pub recording: Option<RecordingArtifact>,
    pub reply_message: Option<ReplyMessage>,
}

impl InputAttachments {
    /// Whether typed text or picked media are present
    pub fn has_text_or_media(&self) -> bool {
        !self.text.is_empty() || !self.medias.is_empty()
    }
}

/// A composed message handed to the send pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftMessage {
    pub id: Uuid,
    pub text: String,
    pub medias: Vec<Media>,
    pub recording: Option<RecordingArtifact>,
    pub reply_message: Option<ReplyMessage>,
    pub created_at: DateTime<Utc>,
}

impl DraftMessage {
    /// Build a draft from the composer's attachments, stamped now
    pub fn from_attachments(attachments: InputAttachments) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: attachments.text,
            medias: attachments.medias,
            recording: attachments.recording,
            reply_message: attachments.reply_message,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_from_extension() {
        assert_eq!(MediaKind::from_path(Path::new("a/b.MOV")), MediaKind::Video);
        assert_eq!(MediaKind::from_path(Path::new("a/b.jpg")), MediaKind::Image);
        assert_eq!(MediaKind::from_path(Path::new("noext")), MediaKind::Image);
    }

    #[test]
    fn attachments_content_check() {
        let mut attachments = InputAttachments::default();
        assert!(!attachments.has_text_or_media());

        attachments.recording = Some(RecordingArtifact::new());
        assert!(!attachments.has_text_or_media());

        attachments.text = "hi".to_string();
        assert!(attachments.has_text_or_media());

        attachments.text.clear();
        attachments.medias.push(Media::from_path("photo.png"));
        assert!(attachments.has_text_or_media());
    }

    #[test]
    fn draft_takes_all_attachments() {
        let attachments = InputAttachments {
            text: "hello".to_string(),
            medias: vec![Media::from_path("clip.mp4")],
            recording: Some(RecordingArtifact::from_file("a.wav", 1.5, vec![0.2])),
            reply_message: Some(ReplyMessage {
                id: "m1".to_string(),
                author: "sam".to_string(),
                text: "question?".to_string(),
            }),
        };

        let draft = DraftMessage::from_attachments(attachments.clone());
        assert_eq!(draft.text, "hello");
        assert_eq!(draft.medias, attachments.medias);
        assert_eq!(draft.recording, attachments.recording);
        assert_eq!(draft.reply_message, attachments.reply_message);
    }

    #[test]
    fn draft_serializes_to_json() {
        let draft = DraftMessage::from_attachments(InputAttachments {
            text: "hi".to_string(),
            ..Default::default()
        });
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["text"], "hi");
        assert!(json["created_at"].is_string());
    }
}

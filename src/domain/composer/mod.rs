//! Composer domain module

mod draft;
mod state;

pub use draft::{DraftMessage, InputAttachments, Media, MediaKind, ReplyMessage};
pub use state::{InputAction, InputState, MediaPickerMode};

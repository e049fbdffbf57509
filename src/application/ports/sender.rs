//! Draft sender port

use crate::domain::composer::DraftMessage;

/// Port for the message send pipeline. Receives finished drafts.
pub trait DraftSender: Send + Sync {
    fn on_draft_ready(&self, draft: DraftMessage);
}

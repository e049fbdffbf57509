//! Microphone permission port

use std::fmt;

use async_trait::async_trait;

/// Microphone permission status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Undetermined => "undetermined",
        }
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Port for asking the platform whether the microphone may be used
#[async_trait]
pub trait MicrophonePermission: Send + Sync {
    /// Current status, without prompting
    fn status(&self) -> PermissionStatus;

    /// Ask for access. Resolves once the platform has an answer.
    async fn request(&self) -> bool;
}

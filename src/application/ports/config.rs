//! Settings storage port

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Where the composer keeps its settings: API key, model, capture format and
/// rate, channels, bitrate, recordings directory and whether to transcribe.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read the stored settings. Keys that were never set stay `None`, and a
    /// missing file reads as an empty config.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Replace the stored settings with `config`
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Location of the settings file
    fn path(&self) -> PathBuf;

    fn exists(&self) -> bool;

    /// Write [`AppConfig::defaults`] so every key is visible for editing.
    /// Returns [`ConfigError::AlreadyExists`] rather than overwriting.
    async fn init(&self) -> Result<(), ConfigError>;
}

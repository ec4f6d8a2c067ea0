//! Recorder settings storage port

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Persistent recorder settings.
///
/// Only `load`, `save`, `path` and `exists` touch storage; the rest is
/// built on top of them.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Stored settings; a missing file yields an empty config
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    fn path(&self) -> PathBuf;

    fn exists(&self) -> bool;

    /// Write the recorder defaults, refusing to overwrite an existing file
    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(
                self.path().to_string_lossy().to_string(),
            ));
        }
        self.save(&AppConfig::defaults()).await
    }

    /// Stored settings for a daemon that must start regardless.
    ///
    /// An unreadable or malformed file is logged and treated as empty.
    async fn load_or_empty(&self) -> AppConfig {
        match self.load().await {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file {}: {}", self.path().display(), e);
                AppConfig::empty()
            }
        }
    }

    /// Load, apply one validated edit, and save.
    ///
    /// Nothing is written when the edit fails.
    async fn update(
        &self,
        edit: &(dyn for<'c> Fn(&'c mut AppConfig) -> Result<(), ConfigError> + Send + Sync),
    ) -> Result<AppConfig, ConfigError> {
        let mut config = self.load().await?;
        edit(&mut config)?;
        self.save(&config).await?;
        Ok(config)
    }
}

//! Audio capture port interfaces

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::recording::{AudioFormat, AudioSource};

use super::catalog::OutputSink;

/// Capture errors
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Audio source {audio_source} is unavailable: {reason}")]
    SourceUnavailable {
        audio_source: AudioSource,
        reason: String,
    },

    #[error("Audio source {audio_source} failed to start: {reason}")]
    StartFailed {
        audio_source: AudioSource,
        reason: String,
    },

    #[error("Failed to configure encoder: {0}")]
    Configure(String),

    #[error("Capture I/O error: {0}")]
    Io(String),

    #[error("Failed to stop capture: {0}")]
    StopFailed(String),
}

impl CaptureError {
    /// True when the failure belongs to the bound source, so a weaker
    /// candidate may still succeed
    pub fn is_source_specific(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::StartFailed { .. }
        )
    }
}

/// One allocation of the physical capture resource.
///
/// Call order: `bind`, `configure`, `prepare`, `start`, `stop`, `release`.
/// `release` must be safe to call in any state.
#[async_trait]
pub trait CaptureHandle: Send {
    /// Attach the handle to a capture source
    async fn bind(&mut self, audio_source: AudioSource) -> Result<(), CaptureError>;

    /// Select container and encoder settings
    async fn configure(&mut self, format: AudioFormat) -> Result<(), CaptureError>;

    /// Point the handle at the output sink
    async fn prepare(&mut self, sink: &OutputSink) -> Result<(), CaptureError>;

    /// Begin capturing samples
    async fn start(&mut self) -> Result<(), CaptureError>;

    /// Stop capturing and flush encoded audio to the sink
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Free the underlying resource
    async fn release(&mut self);
}

/// Factory for fresh capture handles
pub trait CaptureBackend: Send + Sync {
    fn allocate(&self) -> Box<dyn CaptureHandle>;
}

/// Whether the process is currently allowed to capture audio
pub trait CapturePermission: Send + Sync {
    fn is_granted(&self) -> bool;
}

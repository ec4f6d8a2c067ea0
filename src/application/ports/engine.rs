//! Recording engine RPC port interfaces

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::recording::RecordingSession;

/// Faults raised by a remote call. Either one means the connection is gone.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("Recording engine is unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed engine response: {0}")]
    Protocol(String),
}

/// Errors while binding to the engine process
#[derive(Debug, Clone, Error)]
pub enum ConnectError {
    #[error("Connection refused: {0}")]
    Refused(String),

    #[error("Connection timed out")]
    TimedOut,

    #[error("Handshake failed: {0}")]
    Handshake(String),
}

/// Start/stop/query contract of the recording engine.
///
/// Engine faults are reduced to `false`/`None`; an `Err` always means the
/// remote side is unreachable.
#[async_trait]
pub trait RecorderService: Send + Sync {
    async fn start(&self, phone_number: &str, creation_time: i64) -> Result<bool, RemoteError>;

    async fn stop(&self) -> Result<Option<RecordingSession>, RemoteError>;

    async fn is_recording(&self) -> Result<bool, RemoteError>;

    async fn get_active(&self) -> Result<Option<RecordingSession>, RemoteError>;

    /// Drop the connection. In-process services have nothing to close.
    async fn disconnect(&self) -> Result<(), RemoteError> {
        Ok(())
    }
}

/// Establishes a connection to the engine process
#[async_trait]
pub trait EngineConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn RecorderService>, ConnectError>;
}

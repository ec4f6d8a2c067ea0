//! Recording engine use case
//!
//! Owns the single capture resource and walks the audio source fallback
//! chain until one candidate binds, configures and starts.

use async_trait::async_trait;
use chrono::{Local, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::domain::recording::{
    artifact_name, mask_number, normalize_number, AudioFormat, AudioSource, AudioSourceChain,
    CaptureLifecycle, CaptureState, InvalidStateTransition, RecordingSession,
};

use super::ports::{
    CaptureBackend, CaptureError, CaptureHandle, CapturePermission, CatalogError, MediaCatalog,
    RecorderService, RemoteError,
};

/// Errors from the recording engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Audio capture permission is not granted")]
    PermissionDenied,

    #[error("All {attempted} audio sources failed, last error: {last_error}")]
    AllSourcesFailed { attempted: usize, last_error: String },

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Invalid state transition: {0}")]
    InvalidState(#[from] InvalidStateTransition),
}

/// Configuration for the recording engine
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Output container/encoder tier
    pub format: AudioFormat,
    /// Capture sources in fallback order
    pub chain: AudioSourceChain,
}

/// Outcome of binding one candidate
enum BindOutcome {
    Bound(Box<dyn CaptureHandle>),
    SourceFailed(CaptureError),
}

/// Outcome of configuring and starting a bound handle
enum StartOutcome {
    Started(RecordingSession),
    /// Attributable to the bound source; a weaker candidate may still work
    SourceFailed(CaptureError),
    Fatal(EngineError),
}

#[derive(Default)]
struct EngineState {
    lifecycle: CaptureLifecycle,
    handle: Option<Box<dyn CaptureHandle>>,
    session: Option<RecordingSession>,
}

/// The single authority over the physical capture resource.
///
/// Start and stop hold the engine lock for their whole sequence, so at most
/// one session exists and a start never interleaves with a stop.
pub struct RecordingEngine<B, C, P>
where
    B: CaptureBackend,
    C: MediaCatalog,
    P: CapturePermission,
{
    backend: B,
    catalog: C,
    permission: P,
    config: EngineConfig,
    state: Mutex<EngineState>,
}

impl<B, C, P> RecordingEngine<B, C, P>
where
    B: CaptureBackend,
    C: MediaCatalog,
    P: CapturePermission,
{
    /// Create a new engine instance
    pub fn new(backend: B, catalog: C, permission: P, config: EngineConfig) -> Self {
        Self {
            backend,
            catalog,
            permission,
            config,
            state: Mutex::new(EngineState::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get current capture state
    pub async fn state(&self) -> CaptureState {
        self.state.lock().await.lifecycle.state()
    }

    /// Start a recording, superseding any active one
    pub async fn start_recording(
        &self,
        phone_number: &str,
        creation_time: i64,
    ) -> Result<RecordingSession, EngineError> {
        let mut state = self.state.lock().await;

        if state.handle.is_some() {
            info!("Superseding active recording");
            self.stop_locked(&mut state).await;
        }

        if !self.permission.is_granted() {
            warn!("Capture permission not granted, refusing to start");
            return Err(EngineError::PermissionDenied);
        }

        state.lifecycle.begin_prepare()?;

        let number = normalize_number(phone_number);
        match self.acquire(number.as_deref(), creation_time).await {
            Ok((handle, session)) => {
                state.lifecycle.mark_recording()?;
                info!("Recording started: {}", session);
                state.handle = Some(handle);
                state.session = Some(session.clone());
                Ok(session)
            }
            Err(e) => {
                state.lifecycle.abort_prepare()?;
                error!("Failed to start recording for {}: {}", mask_number(number.as_deref()), e);
                Err(e)
            }
        }
    }

    /// Stop the active recording and return its descriptor
    pub async fn stop_recording(&self) -> Option<RecordingSession> {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state).await
    }

    /// True iff a capture handle is held
    pub async fn is_recording(&self) -> bool {
        self.state.lock().await.handle.is_some()
    }

    pub async fn get_active_recording(&self) -> Option<RecordingSession> {
        self.state.lock().await.session.clone()
    }

    async fn stop_locked(&self, state: &mut EngineState) -> Option<RecordingSession> {
        let mut handle = state.handle.take()?;

        if let Err(e) = handle.stop().await {
            warn!("Error while stopping capture: {}", e);
        }
        handle.release().await;

        let session = state.session.take();
        if let Some(session) = &session {
            if let Err(e) = self.catalog.mark_completed(session.catalog_handle).await {
                warn!("Failed to complete catalog entry {}: {}", session.catalog_handle, e);
            }
            info!("Recording stopped: {}", session);
        }

        if let Err(e) = state.lifecycle.finish() {
            debug!("{}", e);
        }
        session
    }

    /// Walk the fallback chain in order until one candidate records
    async fn acquire(
        &self,
        number: Option<&str>,
        creation_time: i64,
    ) -> Result<(Box<dyn CaptureHandle>, RecordingSession), EngineError> {
        let candidates = self.config.chain.candidates();
        let mut last_error: Option<CaptureError> = None;

        for &audio_source in candidates {
            let mut handle = match self.bind_candidate(audio_source).await {
                BindOutcome::Bound(handle) => handle,
                BindOutcome::SourceFailed(e) => {
                    warn!("Audio source {} failed to bind: {}", audio_source, e);
                    last_error = Some(e);
                    continue;
                }
            };

            match self
                .open_and_start(handle.as_mut(), audio_source, number, creation_time)
                .await
            {
                StartOutcome::Started(session) => return Ok((handle, session)),
                StartOutcome::SourceFailed(e) => {
                    handle.release().await;
                    warn!("Audio source {} failed to start: {}", audio_source, e);
                    last_error = Some(e);
                }
                StartOutcome::Fatal(e) => {
                    handle.release().await;
                    return Err(e);
                }
            }
        }

        Err(EngineError::AllSourcesFailed {
            attempted: candidates.len(),
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no audio sources configured".to_string()),
        })
    }

    async fn bind_candidate(&self, audio_source: AudioSource) -> BindOutcome {
        let mut handle = self.backend.allocate();
        match handle.bind(audio_source).await {
            Ok(()) => {
                debug!("Bound audio source {}", audio_source);
                BindOutcome::Bound(handle)
            }
            Err(e) => {
                handle.release().await;
                BindOutcome::SourceFailed(e)
            }
        }
    }

    /// Configure, register a catalog entry, prepare and start.
    /// The catalog entry is deleted again on any failure after insertion.
    async fn open_and_start(
        &self,
        handle: &mut dyn CaptureHandle,
        audio_source: AudioSource,
        number: Option<&str>,
        creation_time: i64,
    ) -> StartOutcome {
        if let Err(e) = handle.configure(self.config.format).await {
            return Self::classify(e);
        }

        let name = artifact_name(number, &Local::now(), self.config.format);
        let (catalog_handle, sink) = match self.catalog.insert_pending(&name, creation_time).await
        {
            Ok(entry) => entry,
            Err(e) => return StartOutcome::Fatal(EngineError::Catalog(e)),
        };

        let started = match handle.prepare(&sink).await {
            Ok(()) => handle.start().await,
            Err(e) => Err(e),
        };

        match started {
            Ok(()) => {
                debug!("Capturing {} from {}", name, audio_source);
                StartOutcome::Started(RecordingSession {
                    phone_number: number.map(str::to_string),
                    creation_time,
                    artifact_name: name,
                    start_time: Utc::now().timestamp_millis(),
                    catalog_handle,
                })
            }
            Err(e) => {
                if let Err(delete_err) = self.catalog.delete(catalog_handle).await {
                    warn!("Failed to delete orphaned catalog entry {}: {}", catalog_handle, delete_err);
                }
                Self::classify(e)
            }
        }
    }

    fn classify(e: CaptureError) -> StartOutcome {
        if e.is_source_specific() {
            StartOutcome::SourceFailed(e)
        } else {
            StartOutcome::Fatal(EngineError::Capture(e))
        }
    }
}

/// In-process RPC surface; engine faults are reduced to bool/None
#[async_trait]
impl<B, C, P> RecorderService for RecordingEngine<B, C, P>
where
    B: CaptureBackend,
    C: MediaCatalog,
    P: CapturePermission,
{
    async fn start(&self, phone_number: &str, creation_time: i64) -> Result<bool, RemoteError> {
        Ok(self.start_recording(phone_number, creation_time).await.is_ok())
    }

    async fn stop(&self) -> Result<Option<RecordingSession>, RemoteError> {
        Ok(self.stop_recording().await)
    }

    async fn is_recording(&self) -> Result<bool, RemoteError> {
        Ok(RecordingEngine::is_recording(self).await)
    }

    async fn get_active(&self) -> Result<Option<RecordingSession>, RemoteError> {
        Ok(self.get_active_recording().await)
    }
}

//! Connection supervisor use case
//!
//! Owns the logical connection to the recording engine, reconnects with
//! exponential backoff, queues one start request while connecting and
//! reacts to call-tracking events.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::connection::{ConnectionMachine, ConnectionState, RetryDecision, RetryPolicy};
use crate::domain::recording::{mask_number, Duration, PendingRequest, RecordingSession};

use super::ports::{
    CallEvent, CallTracker, ConnectError, EngineConnector, Notifier, RecorderNotice,
    RecorderService, RecordingIndex, RemoteError,
};
use super::progress::{ActiveRecordingQuery, ProgressBroadcaster};

/// Configuration for the connection supervisor
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Static recording feature flag
    pub enabled: bool,
    /// Reconnect backoff
    pub retry: RetryPolicy,
    /// Upper bound for a single connect attempt
    pub connect_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retry: RetryPolicy::default(),
            connect_timeout: Duration::default_connect_timeout(),
        }
    }
}

/// External collaborators of the supervisor
pub struct SupervisorDeps {
    pub connector: Arc<dyn EngineConnector>,
    pub notifier: Arc<dyn Notifier>,
    pub index: Arc<dyn RecordingIndex>,
    pub calls: Arc<dyn CallTracker>,
    pub progress: Arc<ProgressBroadcaster>,
}

#[derive(Default)]
struct SupervisorState {
    initialized: bool,
    connection: ConnectionMachine,
    service: Option<Arc<dyn RecorderService>>,
    pending: Option<PendingRequest>,
    connect_task: Option<JoinHandle<()>>,
    retry_task: Option<JoinHandle<()>>,
    /// Bumped on teardown so late connect results and timers are ignored
    generation: u64,
}

struct Inner {
    config: SupervisorConfig,
    deps: SupervisorDeps,
    state: Mutex<SupervisorState>,
}

/// Client-side owner of the engine connection.
///
/// All state transitions run under one lock, so retry timers, connect
/// results and caller requests are serialized.
#[derive(Clone)]
pub struct ConnectionSupervisor {
    inner: Arc<Inner>,
}

impl ConnectionSupervisor {
    pub fn new(config: SupervisorConfig, deps: SupervisorDeps) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                deps,
                state: Mutex::new(SupervisorState::default()),
            }),
        }
    }

    pub fn progress(&self) -> &Arc<ProgressBroadcaster> {
        &self.inner.deps.progress
    }

    pub async fn is_initialized(&self) -> bool {
        self.inner.state.lock().await.initialized
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.inner.state.lock().await.connection.state()
    }

    pub async fn pending_request(&self) -> Option<PendingRequest> {
        self.inner.state.lock().await.pending.clone()
    }

    /// Begin connecting to the engine. No-op when already initialized or
    /// when recording is disabled.
    pub async fn initialize(&self) {
        let mut state = self.inner.state.lock().await;
        if state.initialized {
            debug!("Supervisor already initialized");
            return;
        }
        if !self.inner.config.enabled {
            debug!("Call recording disabled, not connecting");
            return;
        }

        info!("Initializing call recorder, connecting to engine");
        state.initialized = true;
        state.connection.reset();
        self.inner.connect(&mut state);
    }

    /// Cancel retries, drop the connection and forget any queued request
    pub async fn uninitialize(&self) {
        let mut state = self.inner.state.lock().await;
        if !state.initialized {
            return;
        }

        info!("Uninitializing call recorder");
        state.generation = state.generation.wrapping_add(1);
        if let Some(task) = state.retry_task.take() {
            task.abort();
        }
        if let Some(task) = state.connect_task.take() {
            task.abort();
        }
        if let Some(service) = state.service.take() {
            if let Err(e) = service.disconnect().await {
                warn!("Error disconnecting from recording engine: {}", e);
            }
        }
        state.pending = None;
        state.connection.teardown();
        state.initialized = false;
        drop(state);

        self.inner.deps.progress.recording_stopped();
    }

    /// Request a recording.
    ///
    /// Returns true when the engine started recording, or when the request
    /// was queued because the connection is still being established.
    pub async fn start_recording(&self, phone_number: &str, creation_time: i64) -> bool {
        let mut state = self.inner.state.lock().await;
        let masked = mask_number(Some(phone_number));
        info!("Start recording requested for {}", masked);

        if !state.initialized {
            error!("Recorder not initialized, cannot start recording");
            self.inner.notify(RecorderNotice::Failed);
            return false;
        }

        let request = PendingRequest::new(phone_number, creation_time);
        if state.connection.is_connected() {
            return self.inner.dispatch(&mut state, request).await;
        }

        if state.connection.is_exhausted() {
            error!("Recording engine unreachable, cannot start recording");
            self.inner.notify(RecorderNotice::Failed);
            return false;
        }

        info!("Engine connection in progress, queueing start request");
        if state.pending.replace(request).is_some() {
            debug!("Replaced previously queued start request");
        }
        self.inner.notify(RecorderNotice::Starting);
        true
    }

    /// Stop the active recording and hand the result to the index
    pub async fn finish_recording(&self) {
        let mut state = self.inner.state.lock().await;

        match state.service.clone() {
            Some(service) => match service.stop().await {
                Ok(Some(session)) => {
                    info!("Recording finished: {}", session);
                    self.inner.hand_off(session);
                }
                Ok(None) => debug!("No active recording to finish"),
                Err(e) => {
                    error!("Failed to stop recording: {}", e);
                    self.inner.connection_lost(&mut state, e);
                }
            },
            None => debug!("Not connected to recording engine, nothing to stop"),
        }
        drop(state);

        self.inner.deps.progress.recording_stopped();
    }

    /// False when not connected or the engine is unreachable
    pub async fn is_recording(&self) -> bool {
        self.inner.is_recording().await
    }

    /// None when not connected or the engine is unreachable
    pub async fn get_active_recording(&self) -> Option<RecordingSession> {
        self.inner.get_active_recording().await
    }

    /// React to a host call-tracking event
    pub async fn on_call_event(&self, event: CallEvent) {
        let calls = Arc::clone(&self.inner.deps.calls);
        match event {
            CallEvent::CallListChanged => {
                if !self.is_initialized().await {
                    if calls.active_call_exists() {
                        self.initialize().await;
                    }
                    return;
                }

                if let Some(active) = self.get_active_recording().await {
                    if calls.call_on_hold(active.phone_number.as_deref()) {
                        info!("Call {} placed on hold, finishing recording", active.masked_number());
                        self.finish_recording().await;
                    }
                }
            }
            CallEvent::CallDisconnected { number } => {
                if let Some(active) = self.get_active_recording().await {
                    if active.is_subject(number.as_deref()) {
                        info!("Call {} disconnected, finishing recording", active.masked_number());
                        self.finish_recording().await;
                    }
                }

                if !calls.active_call_exists() {
                    self.uninitialize().await;
                }
            }
        }
    }
}

impl Inner {
    /// Spawn one connect attempt bounded by the connect timeout
    fn connect(self: &Arc<Self>, state: &mut SupervisorState) {
        state.connection.begin_connect();
        let generation = state.generation;
        debug!("Connecting to recording engine (retry {})", state.connection.retry_count());

        let inner = Arc::clone(self);
        let task = tokio::spawn(async move {
            let timeout = inner.config.connect_timeout.as_std();
            let result = match tokio::time::timeout(timeout, inner.deps.connector.connect()).await
            {
                Ok(result) => result,
                Err(_) => Err(ConnectError::TimedOut),
            };
            inner.on_connect_result(generation, result).await;
        });

        if let Some(previous) = state.connect_task.replace(task) {
            previous.abort();
        }
    }

    async fn on_connect_result(
        self: &Arc<Self>,
        generation: u64,
        result: Result<Arc<dyn RecorderService>, ConnectError>,
    ) {
        let mut state = self.state.lock().await;
        if state.generation != generation || !state.initialized {
            if let Ok(service) = result {
                if let Err(e) = service.disconnect().await {
                    debug!("Error dropping stale engine connection: {}", e);
                }
            }
            return;
        }
        state.connect_task = None;

        match result {
            Ok(service) => {
                info!("Connected to recording engine");
                state.connection.connected();
                state.service = Some(service);

                if let Some(request) = state.pending.take() {
                    info!("Dispatching queued start request");
                    self.dispatch(&mut state, request).await;
                }
            }
            Err(e) => {
                warn!("Failed to connect to recording engine: {}", e);
                let decision = state.connection.connect_failed(&self.config.retry);
                self.schedule_retry(&mut state, decision);
            }
        }
    }

    fn schedule_retry(self: &Arc<Self>, state: &mut SupervisorState, decision: RetryDecision) {
        match decision {
            RetryDecision::Retry { attempt, delay } => {
                info!(
                    "Retrying engine connection in {}ms (attempt {}/{})",
                    delay.as_millis(),
                    attempt,
                    self.config.retry.max_retries()
                );
                let generation = state.generation;
                let inner = Arc::clone(self);
                let task = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let mut state = inner.state.lock().await;
                    if state.generation != generation || !state.initialized {
                        return;
                    }
                    state.retry_task = None;
                    inner.connect(&mut state);
                });
                if let Some(previous) = state.retry_task.replace(task) {
                    previous.abort();
                }
            }
            RetryDecision::Exhausted => {
                error!(
                    "Max retries reached, giving up on recording engine after {} attempts",
                    self.config.retry.max_retries()
                );
                state.pending = None;
                self.notify(RecorderNotice::Failed);
            }
        }
    }

    /// Issue the start call on a bound connection
    async fn dispatch(self: &Arc<Self>, state: &mut SupervisorState, request: PendingRequest) -> bool {
        let Some(service) = state.service.clone() else {
            return false;
        };

        match service
            .start(&request.phone_number, request.creation_time)
            .await
        {
            Ok(true) => {
                info!("Recording started successfully");
                let query: Arc<dyn ActiveRecordingQuery> =
                    Arc::new(SessionQuery(Arc::clone(self)));
                self.deps.progress.recording_started(query);
                self.notify(RecorderNotice::Started);
                true
            }
            Ok(false) => {
                error!("Recording engine refused to start recording");
                self.notify(RecorderNotice::Failed);
                false
            }
            Err(e) => {
                error!("Remote failure when starting recording: {}", e);
                self.notify(RecorderNotice::Failed);
                self.connection_lost(state, e);
                false
            }
        }
    }

    /// A remote fault is an immediate disconnect; any session it carried is
    /// reported as stopped
    fn connection_lost(self: &Arc<Self>, state: &mut SupervisorState, cause: RemoteError) {
        if state.service.take().is_none() {
            return;
        }
        warn!("Lost connection to recording engine: {}", cause);
        self.deps.progress.recording_stopped();
        let decision = state.connection.lost(&self.config.retry);
        self.schedule_retry(state, decision);
    }

    /// Index sessions with a number; announce the file otherwise
    fn hand_off(&self, session: RecordingSession) {
        if session.phone_number.is_some() {
            let index = Arc::clone(&self.deps.index);
            tokio::spawn(async move {
                if let Err(e) = index.put_recording(&session).await {
                    error!("Failed to index recording {}: {}", session.artifact_name, e);
                }
            });
        } else {
            self.notify(RecorderNotice::FileSaved {
                artifact_name: session.artifact_name,
            });
        }
    }

    /// Fire-and-forget user notice
    fn notify(&self, notice: RecorderNotice) {
        let notifier = Arc::clone(&self.deps.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.notice(&notice).await {
                debug!("Notification failed: {}", e);
            }
        });
    }

    async fn is_recording(self: &Arc<Self>) -> bool {
        let mut state = self.state.lock().await;
        let Some(service) = state.service.clone() else {
            return false;
        };
        match service.is_recording().await {
            Ok(recording) => recording,
            Err(e) => {
                warn!("Exception checking recording status: {}", e);
                self.connection_lost(&mut state, e);
                false
            }
        }
    }

    async fn get_active_recording(self: &Arc<Self>) -> Option<RecordingSession> {
        let mut state = self.state.lock().await;
        let service = state.service.clone()?;
        match service.get_active().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Exception getting active recording: {}", e);
                self.connection_lost(&mut state, e);
                None
            }
        }
    }
}

/// Progress tick view of the engine session
struct SessionQuery(Arc<Inner>);

#[async_trait]
impl ActiveRecordingQuery for SessionQuery {
    async fn active_recording(&self) -> Result<Option<RecordingSession>, RemoteError> {
        let mut state = self.0.state.lock().await;
        let Some(service) = state.service.clone() else {
            return Ok(None);
        };
        match service.get_active().await {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!("Engine fault during progress tick: {}", e);
                self.0.connection_lost(&mut state, e.clone());
                Err(e)
            }
        }
    }
}

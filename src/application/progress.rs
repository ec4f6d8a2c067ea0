//! Recording progress fan-out

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::ports::RemoteError;
use crate::domain::recording::{Duration, RecordingSession};

/// Receives recording lifecycle and elapsed-time events
pub trait ProgressListener: Send + Sync {
    fn on_start_recording(&self);

    fn on_stop_recording(&self);

    fn on_recording_time_progress(&self, elapsed_ms: u64);
}

/// Source of the currently active session for the periodic tick.
///
/// An error means the engine faulted and the session is lost.
#[async_trait]
pub trait ActiveRecordingQuery: Send + Sync {
    async fn active_recording(&self) -> Result<Option<RecordingSession>, RemoteError>;
}

/// Listener registry plus the periodic progress tick.
///
/// Notification iterates over a snapshot of the registry, so listeners may
/// register or unregister from inside a callback.
pub struct ProgressBroadcaster {
    listeners: Mutex<Vec<Arc<dyn ProgressListener>>>,
    tick: Mutex<Option<JoinHandle<()>>>,
    active: AtomicBool,
    interval: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn same_listener(a: &Arc<dyn ProgressListener>, b: &Arc<dyn ProgressListener>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

impl ProgressBroadcaster {
    pub fn new(interval: Duration) -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            tick: Mutex::new(None),
            active: AtomicBool::new(false),
            interval,
        }
    }

    /// Add a listener; registering the same listener twice is a no-op
    pub fn register(&self, listener: Arc<dyn ProgressListener>) {
        let mut listeners = lock(&self.listeners);
        if !listeners.iter().any(|l| same_listener(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Remove a listener; unknown listeners are ignored
    pub fn unregister(&self, listener: &Arc<dyn ProgressListener>) {
        lock(&self.listeners).retain(|l| !same_listener(l, listener));
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// True between a confirmed start and the following stop
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> Vec<Arc<dyn ProgressListener>> {
        lock(&self.listeners).clone()
    }

    /// Notify "started" and begin the periodic tick.
    ///
    /// A start while already active supersedes the previous session, which
    /// is reported as stopped first.
    pub fn recording_started(self: &Arc<Self>, query: Arc<dyn ActiveRecordingQuery>) {
        if self.active.swap(true, Ordering::SeqCst) {
            debug!("Recording superseded by a new start");
            for listener in self.snapshot() {
                listener.on_stop_recording();
            }
        }
        for listener in self.snapshot() {
            listener.on_start_recording();
        }

        let weak = Arc::downgrade(self);
        let period = self.interval.as_std();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                if !Self::tick_once(&weak, query.as_ref()).await {
                    break;
                }
            }
        });

        if let Some(previous) = lock(&self.tick).replace(task) {
            previous.abort();
        }
    }

    /// One progress tick; false once the session is gone
    async fn tick_once(weak: &Weak<Self>, query: &dyn ActiveRecordingQuery) -> bool {
        let session = match query.active_recording().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("No active recording, progress tick ends");
                return false;
            }
            Err(e) => {
                warn!("Recording lost during progress tick: {}", e);
                if let Some(this) = weak.upgrade() {
                    this.recording_stopped();
                }
                return false;
            }
        };
        let Some(this) = weak.upgrade() else {
            return false;
        };
        if !this.is_active() {
            return false;
        }

        let elapsed = session.elapsed_ms(Utc::now().timestamp_millis());
        for listener in this.snapshot() {
            listener.on_recording_time_progress(elapsed);
        }
        true
    }

    /// Notify "stopped" once per start and cancel the tick
    pub fn recording_stopped(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            for listener in self.snapshot() {
                listener.on_stop_recording();
            }
        }
        if let Some(task) = lock(&self.tick).take() {
            task.abort();
        }
    }
}

impl Drop for ProgressBroadcaster {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.tick).take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::CatalogHandle;
    use std::sync::atomic::AtomicU64;

    #[derive(Default)]
    struct CountingListener {
        starts: AtomicU64,
        stops: AtomicU64,
        ticks: AtomicU64,
        last_elapsed: AtomicU64,
    }

    impl ProgressListener for CountingListener {
        fn on_start_recording(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stop_recording(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn on_recording_time_progress(&self, elapsed_ms: u64) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            self.last_elapsed.store(elapsed_ms, Ordering::SeqCst);
        }
    }

    struct FixedQuery {
        session: Mutex<Option<RecordingSession>>,
        faulted: std::sync::atomic::AtomicBool,
    }

    impl FixedQuery {
        fn active() -> Arc<Self> {
            Arc::new(Self {
                session: Mutex::new(Some(RecordingSession {
                    phone_number: Some("+15551234".to_string()),
                    creation_time: 0,
                    artifact_name: "a.flac".to_string(),
                    start_time: Utc::now().timestamp_millis(),
                    catalog_handle: CatalogHandle(1),
                })),
                faulted: std::sync::atomic::AtomicBool::new(false),
            })
        }

        fn end(&self) {
            *self.session.lock().unwrap() = None;
        }
    }

    #[async_trait]
    impl ActiveRecordingQuery for FixedQuery {
        async fn active_recording(&self) -> Result<Option<RecordingSession>, RemoteError> {
            if self.faulted.load(Ordering::SeqCst) {
                return Err(RemoteError::Unavailable("engine gone".to_string()));
            }
            Ok(self.session.lock().unwrap().clone())
        }
    }

    /// Unregisters itself on the first start notification
    struct SelfRemovingListener {
        broadcaster: Arc<ProgressBroadcaster>,
        me: Mutex<Option<Arc<dyn ProgressListener>>>,
        starts: AtomicU64,
    }

    impl ProgressListener for SelfRemovingListener {
        fn on_start_recording(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if let Some(me) = self.me.lock().unwrap().take() {
                self.broadcaster.unregister(&me);
            }
        }

        fn on_stop_recording(&self) {}

        fn on_recording_time_progress(&self, _elapsed_ms: u64) {}
    }

    fn broadcaster() -> Arc<ProgressBroadcaster> {
        Arc::new(ProgressBroadcaster::new(Duration::from_millis(500)))
    }

    #[test]
    fn register_is_idempotent() {
        let b = broadcaster();
        let listener: Arc<dyn ProgressListener> = Arc::new(CountingListener::default());

        b.register(Arc::clone(&listener));
        b.register(Arc::clone(&listener));
        assert_eq!(b.listener_count(), 1);

        b.unregister(&listener);
        b.unregister(&listener);
        assert_eq!(b.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_while_active_then_stops_once() {
        let b = broadcaster();
        let listener = Arc::new(CountingListener::default());
        b.register(listener.clone());
        let query = FixedQuery::active();

        b.recording_started(query.clone());
        assert_eq!(listener.starts.load(Ordering::SeqCst), 1);

        tokio::time::sleep(std::time::Duration::from_millis(1_250)).await;
        // immediate tick plus ticks at 500ms and 1000ms
        assert_eq!(listener.ticks.load(Ordering::SeqCst), 3);

        b.recording_stopped();
        b.recording_stopped();
        assert_eq!(listener.stops.load(Ordering::SeqCst), 1);

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert_eq!(listener.ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_ends_when_session_disappears() {
        let b = broadcaster();
        let listener = Arc::new(CountingListener::default());
        b.register(listener.clone());
        let query = FixedQuery::active();

        b.recording_started(query.clone());
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(listener.ticks.load(Ordering::SeqCst), 1);

        query.end();
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert_eq!(listener.ticks.load(Ordering::SeqCst), 1);
        assert_eq!(listener.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn engine_fault_during_tick_reports_stop() {
        let b = broadcaster();
        let listener = Arc::new(CountingListener::default());
        b.register(listener.clone());
        let query = FixedQuery::active();

        b.recording_started(query.clone());
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        query.faulted.store(true, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(600)).await;

        assert_eq!(listener.stops.load(Ordering::SeqCst), 1);
        assert!(!b.is_active());
        assert_eq!(listener.ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn superseding_start_reports_previous_stop() {
        let b = broadcaster();
        let listener = Arc::new(CountingListener::default());
        b.register(listener.clone());

        b.recording_started(FixedQuery::active());
        b.recording_started(FixedQuery::active());
        assert_eq!(listener.starts.load(Ordering::SeqCst), 2);
        assert_eq!(listener.stops.load(Ordering::SeqCst), 1);
        assert!(b.is_active());

        b.recording_stopped();
        assert_eq!(listener.stops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stop_without_start_is_silent() {
        let b = broadcaster();
        let listener = Arc::new(CountingListener::default());
        b.register(listener.clone());

        b.recording_stopped();
        assert_eq!(listener.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn listener_may_unregister_during_notification() {
        let b = broadcaster();
        let removing = Arc::new(SelfRemovingListener {
            broadcaster: Arc::clone(&b),
            me: Mutex::new(None),
            starts: AtomicU64::new(0),
        });
        let as_dyn: Arc<dyn ProgressListener> = removing.clone();
        *removing.me.lock().unwrap() = Some(Arc::clone(&as_dyn));
        let counting = Arc::new(CountingListener::default());

        b.register(as_dyn);
        b.register(counting.clone());
        b.recording_started(FixedQuery::active());

        assert_eq!(removing.starts.load(Ordering::SeqCst), 1);
        assert_eq!(counting.starts.load(Ordering::SeqCst), 1);
        assert_eq!(b.listener_count(), 1);
        b.recording_stopped();
    }
}

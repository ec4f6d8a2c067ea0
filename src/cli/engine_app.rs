//! Engine daemon runner

use std::process::ExitCode;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::application::ports::RecorderService;
use crate::application::{EngineConfig, RecordingEngine};
use crate::domain::config::AppConfig;
use crate::domain::recording::RecordingSession;
use crate::infrastructure::{CpalCaptureBackend, FsCatalog, InputDevicePermission};

use super::app::{EXIT_ERROR, EXIT_SUCCESS};
use super::ipc::{EngineSocketServer, SocketPath};
use super::pid_file::PidFile;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Stop serving, then finalize any capture still in progress.
///
/// The server goes first so no client can open a session after the final
/// stop. Dropping the server also removes the socket file.
async fn drain(
    server_task: JoinHandle<()>,
    service: &dyn RecorderService,
) -> Option<RecordingSession> {
    server_task.abort();
    let _ = server_task.await;

    match service.stop().await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to finalize recording on shutdown: {}", e);
            None
        }
    }
}

type CpalEngine = RecordingEngine<CpalCaptureBackend, FsCatalog, InputDevicePermission>;

/// Run the recording engine until SIGINT/SIGTERM
pub async fn run_engine(config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();

    let socket_path = SocketPath::resolve(config.socket_path.as_deref());
    let pid_file = PidFile::for_socket(&socket_path);
    if let Err(e) = pid_file.acquire() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let mut shutdown = match ShutdownSignal::install() {
        Ok(s) => s,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let recordings_dir = config.recordings_dir_or_default();
    let engine_config = EngineConfig {
        format: config.audio_format_or_default(),
        chain: config.source_chain(),
    };
    info!(
        "Engine format {} with sources {}",
        engine_config.format, engine_config.chain
    );

    let engine: Arc<CpalEngine> = Arc::new(RecordingEngine::new(
        CpalCaptureBackend::new(),
        FsCatalog::new(&recordings_dir),
        InputDevicePermission::new(),
        engine_config,
    ));

    let mut server = EngineSocketServer::new(socket_path.clone());
    if let Err(e) = server.bind() {
        presenter.error(&format!("Failed to bind socket: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let service: Arc<dyn RecorderService> = engine.clone();
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run(service).await {
            error!("Engine socket server stopped: {}", e);
        }
    });

    presenter.engine_status("Started, waiting for the supervisor...");
    presenter.info(&format!(
        "PID: {} | Socket: {} | Recordings: {}",
        std::process::id(),
        socket_path.path().display(),
        recordings_dir.display()
    ));

    shutdown.wait().await;
    presenter.engine_status("Shutting down...");

    if let Some(session) = drain(server_task, engine.as_ref()).await {
        presenter.success(&format!("Saved {} on shutdown", session.artifact_name));
    }

    match pid_file.release() {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::RemoteError;
    use crate::cli::ipc::EngineSocketClient;
    use crate::domain::recording::CatalogHandle;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeEngine {
        active: Mutex<Option<RecordingSession>>,
        starts: Mutex<u32>,
    }

    #[async_trait]
    impl RecorderService for FakeEngine {
        async fn start(&self, phone_number: &str, creation_time: i64) -> Result<bool, RemoteError> {
            *self.starts.lock().unwrap() += 1;
            *self.active.lock().unwrap() = Some(RecordingSession {
                phone_number: Some(phone_number.to_string()),
                creation_time,
                artifact_name: format!("{}_0.flac", phone_number),
                start_time: 0,
                catalog_handle: CatalogHandle(1),
            });
            Ok(true)
        }

        async fn stop(&self) -> Result<Option<RecordingSession>, RemoteError> {
            Ok(self.active.lock().unwrap().take())
        }

        async fn is_recording(&self) -> Result<bool, RemoteError> {
            Ok(self.active.lock().unwrap().is_some())
        }

        async fn get_active(&self) -> Result<Option<RecordingSession>, RemoteError> {
            Ok(self.active.lock().unwrap().clone())
        }
    }

    #[tokio::test]
    async fn drain_closes_socket_before_final_stop() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = SocketPath::with_path(dir.path().join("engine.sock"));
        let mut server = EngineSocketServer::new(socket_path.clone());
        server.bind().unwrap();

        let engine = Arc::new(FakeEngine::default());
        let service: Arc<dyn RecorderService> = engine.clone();
        let server_task = tokio::spawn(async move {
            let _ = server.run(service).await;
        });

        let client = EngineSocketClient::connect(&socket_path).await.unwrap();
        assert!(client.start("+15551234", 1).await.unwrap());

        let saved = drain(server_task, engine.as_ref()).await;
        assert_eq!(saved.unwrap().artifact_name, "+15551234_0.flac");

        assert!(!socket_path.exists());
        assert!(client.start("+15557777", 2).await.is_err());
        assert!(EngineSocketClient::connect(&socket_path).await.is_err());
        assert_eq!(*engine.starts.lock().unwrap(), 1);
        assert!(engine.active.lock().unwrap().is_none());
    }
}

//! Unix Domain Socket transport for the engine daemon

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::protocol::{
    decode_request, decode_response, dispatch, encode_line, EngineRequest, EngineResponse,
};
use crate::application::ports::{ConnectError, EngineConnector, RecorderService, RemoteError};
use crate::domain::recording::RecordingSession;

const SOCKET_FILE_NAME: &str = "call-recorder.sock";

/// Socket path resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketPath {
    path: PathBuf,
}

impl SocketPath {
    /// Create socket path, preferring XDG_RUNTIME_DIR
    pub fn new() -> Self {
        let path = std::env::var("XDG_RUNTIME_DIR")
            .map(|dir| PathBuf::from(dir).join(SOCKET_FILE_NAME))
            .unwrap_or_else(|_| std::env::temp_dir().join(SOCKET_FILE_NAME));
        Self { path }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Configured path if any, otherwise the runtime default
    pub fn resolve(configured: Option<&str>) -> Self {
        match configured {
            Some(path) if !path.trim().is_empty() => Self::with_path(path),
            _ => Self::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove socket file if it exists
    pub fn cleanup(&self) -> io::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for SocketPath {
    fn default() -> Self {
        Self::new()
    }
}

/// Serves the engine's recorder contract on a socket
pub struct EngineSocketServer {
    socket_path: SocketPath,
    listener: Option<UnixListener>,
}

impl EngineSocketServer {
    pub fn new(socket_path: SocketPath) -> Self {
        Self {
            socket_path,
            listener: None,
        }
    }

    pub fn bind(&mut self) -> io::Result<()> {
        // Remove stale socket file if it exists
        self.socket_path.cleanup()?;
        self.listener = Some(UnixListener::bind(self.socket_path.path())?);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.socket_path.path()
    }

    /// Accept clients until the task is dropped.
    ///
    /// Connection tasks are owned here, so dropping this future also closes
    /// every client connection.
    pub async fn run(&self, service: Arc<dyn RecorderService>) -> io::Result<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "Socket not bound"))?;
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        debug!("Supervisor connected");
                        let service = Arc::clone(&service);
                        connections.spawn(async move {
                            if let Err(e) = serve_connection(stream, service).await {
                                warn!("Socket connection error: {}", e);
                            }
                        });
                    }
                    Err(e) => warn!("Socket accept error: {}", e),
                },
                Some(_) = connections.join_next() => {}
            }
        }
    }
}

impl Drop for EngineSocketServer {
    fn drop(&mut self) {
        let _ = self.socket_path.cleanup();
    }
}

/// Answer requests from one client until it hangs up
async fn serve_connection(stream: UnixStream, service: Arc<dyn RecorderService>) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match decode_request(&line) {
            Ok(request) => dispatch(service.as_ref(), request).await,
            Err(e) => EngineResponse::Error {
                message: format!("invalid request: {}", e),
            },
        };
        let out = encode_line(&response).map_err(io::Error::other)?;
        writer.write_all(out.as_bytes()).await?;
        writer.flush().await?;
    }

    debug!("Supervisor disconnected");
    Ok(())
}

struct ClientStream {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// Persistent connection to the engine daemon.
///
/// Requests are strictly request/response; the stream lock keeps each pair
/// together when calls overlap.
pub struct EngineSocketClient {
    stream: Mutex<Option<ClientStream>>,
}

impl EngineSocketClient {
    pub async fn connect(socket_path: &SocketPath) -> io::Result<Self> {
        let stream = UnixStream::connect(socket_path.path()).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            stream: Mutex::new(Some(ClientStream {
                reader: BufReader::new(reader),
                writer,
            })),
        })
    }

    pub async fn call(&self, request: &EngineRequest) -> Result<EngineResponse, RemoteError> {
        let mut guard = self.stream.lock().await;
        let stream = guard
            .as_mut()
            .ok_or_else(|| RemoteError::Unavailable("connection closed".to_string()))?;

        let line = encode_line(request).map_err(|e| RemoteError::Protocol(e.to_string()))?;
        if let Err(e) = write_line(stream, &line).await {
            *guard = None;
            return Err(RemoteError::Unavailable(e.to_string()));
        }

        let mut response = String::new();
        let read = stream.reader.read_line(&mut response).await;
        match read {
            Ok(0) => {
                *guard = None;
                Err(RemoteError::Unavailable("engine closed the connection".to_string()))
            }
            Ok(_) => match decode_response(&response)
                .map_err(|e| RemoteError::Protocol(e.to_string()))?
            {
                EngineResponse::Error { message } => Err(RemoteError::Protocol(message)),
                other => Ok(other),
            },
            Err(e) => {
                *guard = None;
                Err(RemoteError::Unavailable(e.to_string()))
            }
        }
    }
}

async fn write_line(stream: &mut ClientStream, line: &str) -> io::Result<()> {
    stream.writer.write_all(line.as_bytes()).await?;
    stream.writer.flush().await
}

fn unexpected(response: EngineResponse) -> RemoteError {
    RemoteError::Protocol(format!("unexpected response: {:?}", response))
}

#[async_trait]
impl RecorderService for EngineSocketClient {
    async fn start(&self, phone_number: &str, creation_time: i64) -> Result<bool, RemoteError> {
        let request = EngineRequest::Start {
            phone_number: phone_number.to_string(),
            creation_time,
        };
        match self.call(&request).await? {
            EngineResponse::Started { ok } => Ok(ok),
            other => Err(unexpected(other)),
        }
    }

    async fn stop(&self) -> Result<Option<RecordingSession>, RemoteError> {
        match self.call(&EngineRequest::Stop).await? {
            EngineResponse::Stopped { session } => Ok(session),
            other => Err(unexpected(other)),
        }
    }

    async fn is_recording(&self) -> Result<bool, RemoteError> {
        match self.call(&EngineRequest::IsRecording).await? {
            EngineResponse::Recording { active } => Ok(active),
            other => Err(unexpected(other)),
        }
    }

    async fn get_active(&self) -> Result<Option<RecordingSession>, RemoteError> {
        match self.call(&EngineRequest::GetActive).await? {
            EngineResponse::Active { session } => Ok(session),
            other => Err(unexpected(other)),
        }
    }

    async fn disconnect(&self) -> Result<(), RemoteError> {
        if let Some(mut stream) = self.stream.lock().await.take() {
            stream
                .writer
                .shutdown()
                .await
                .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        }
        Ok(())
    }
}

/// Connects the supervisor to a running engine daemon
pub struct SocketConnector {
    socket_path: SocketPath,
}

impl SocketConnector {
    pub fn new(socket_path: SocketPath) -> Self {
        Self { socket_path }
    }
}

#[async_trait]
impl EngineConnector for SocketConnector {
    async fn connect(&self) -> Result<Arc<dyn RecorderService>, ConnectError> {
        let client = EngineSocketClient::connect(&self.socket_path)
            .await
            .map_err(|e| ConnectError::Refused(e.to_string()))?;

        // Handshake: the daemon must answer a query before we hand it out
        client
            .is_recording()
            .await
            .map_err(|e| ConnectError::Handshake(e.to_string()))?;

        Ok(Arc::new(client))
    }
}

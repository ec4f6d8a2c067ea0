//! IPC between the supervisor and the engine daemon
//!
//! Newline-delimited JSON over a Unix Domain Socket.

pub mod protocol;
#[cfg(unix)]
mod unix_socket;

pub use protocol::{EngineRequest, EngineResponse};
#[cfg(unix)]
pub use unix_socket::{EngineSocketClient, EngineSocketServer, SocketConnector, SocketPath};

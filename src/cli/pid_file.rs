//! Single-instance guard for the engine daemon.
//!
//! The PID file lives beside the engine socket, so engines serving
//! different sockets do not block each other. It records the owner's PID
//! on the first line and the socket it serves on the second.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{debug, warn};

use super::ipc::SocketPath;

/// Engine that currently owns a socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOwner {
    pub pid: u32,
    pub socket: PathBuf,
}

impl EngineOwner {
    fn parse(contents: &str) -> Option<Self> {
        let mut lines = contents.lines();
        let pid = lines.next()?.trim().parse().ok()?;
        let socket = lines.next().map(str::trim).unwrap_or_default();
        Some(Self {
            pid,
            socket: PathBuf::from(socket),
        })
    }

    fn is_alive(&self) -> bool {
        let Ok(raw) = i32::try_from(self.pid) else {
            return false;
        };
        // EPERM still means the process exists
        !matches!(kill(Pid::from_raw(raw), None::<Signal>), Err(Errno::ESRCH))
    }
}

pub struct PidFile {
    path: PathBuf,
    socket: PathBuf,
}

impl PidFile {
    /// `<socket>.pid` next to the engine socket
    pub fn for_socket(socket_path: &SocketPath) -> Self {
        let socket = socket_path.path().to_path_buf();
        let mut name = socket.as_os_str().to_owned();
        name.push(".pid");
        Self {
            path: PathBuf::from(name),
            socket,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Live engine recorded in the file; stale files are removed
    pub fn owner(&self) -> Option<EngineOwner> {
        let contents = fs::read_to_string(&self.path).ok()?;
        let Some(owner) = EngineOwner::parse(&contents) else {
            warn!("Ignoring unreadable PID file {}", self.path.display());
            return None;
        };
        if owner.is_alive() {
            return Some(owner);
        }

        debug!("Removing stale PID file of engine {}", owner.pid);
        let _ = fs::remove_file(&self.path);
        None
    }

    /// Claim the socket for this process
    pub fn acquire(&self) -> Result<(), PidFileError> {
        if let Some(owner) = self.owner() {
            return Err(PidFileError::AlreadyRunning {
                pid: owner.pid,
                socket: owner.socket,
            });
        }
        // An unparsable leftover is not an owner
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(PidFileError::WriteFailed)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => PidFileError::Contended,
                _ => PidFileError::WriteFailed(e),
            })?;
        writeln!(file, "{}", process::id()).map_err(PidFileError::WriteFailed)?;
        writeln!(file, "{}", self.socket.display()).map_err(PidFileError::WriteFailed)?;
        Ok(())
    }

    /// Remove the file if this process still owns it
    pub fn release(&self) -> Result<(), PidFileError> {
        let ours = fs::read_to_string(&self.path)
            .ok()
            .and_then(|c| EngineOwner::parse(&c))
            .is_some_and(|owner| owner.pid == process::id());
        if ours {
            fs::remove_file(&self.path).map_err(PidFileError::RemoveFailed)?;
        }
        Ok(())
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PidFileError {
    #[error("Another engine is already serving {} (PID: {pid})", .socket.display())]
    AlreadyRunning { pid: u32, socket: PathBuf },

    #[error("Another engine is starting on the same socket")]
    Contended,

    #[error("Failed to write PID file: {0}")]
    WriteFailed(io::Error),

    #[error("Failed to remove PID file: {0}")]
    RemoveFailed(io::Error),
}

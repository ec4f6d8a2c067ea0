//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! the engine IPC transport and the runners for each mode.

pub mod app;
pub mod args;
pub mod call_feed;
pub mod config_cmd;
#[cfg(unix)]
pub mod ctl_cmd;
#[cfg(unix)]
pub mod engine_app;
pub mod ipc;
#[cfg(unix)]
pub mod pid_file;
pub mod policy_cmd;
pub mod presenter;
#[cfg(unix)]
pub mod signals;
#[cfg(unix)]
pub mod supervise_app;

// Re-export commonly used types
pub use app::{init_tracing, load_merged_config, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, CtlAction};
#[cfg(unix)]
pub use engine_app::run_engine;
pub use presenter::Presenter;
#[cfg(unix)]
pub use supervise_app::run_supervisor;

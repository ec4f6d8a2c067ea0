//! Call Recorder - call-recording control plane
//!
//! A recording engine owns the capture resource and walks an audio source
//! fallback chain; a connection supervisor keeps a resilient link to it,
//! gates recording on the country policy and fans out progress.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, state machines, policy table and errors
//! - **Application**: Engine, supervisor, policy gate, progress broadcaster and port traits
//! - **Infrastructure**: Adapter implementations (cpal capture, file catalog, notifications, etc.)
//! - **CLI**: Command-line interface, engine IPC, argument parsing and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

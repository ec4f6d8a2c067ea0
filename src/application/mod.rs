//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod engine;
pub mod policy;
pub mod ports;
pub mod progress;
pub mod supervisor;

// Re-export use cases
pub use engine::{EngineConfig, EngineError, RecordingEngine};
pub use policy::{recording_enabled_at_build, PolicyGate};
pub use progress::{ActiveRecordingQuery, ProgressBroadcaster, ProgressListener};
pub use supervisor::{ConnectionSupervisor, SupervisorConfig, SupervisorDeps};

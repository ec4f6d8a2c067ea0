//! Domain layer - Core business logic
//!
//! Contains value objects, state machines, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod connection;
pub mod error;
pub mod policy;
pub mod recording;

// Re-export common types
pub use config::AppConfig;
pub use connection::{ConnectionMachine, ConnectionState, RetryDecision, RetryPolicy};
pub use error::*;
pub use policy::{CountryPolicyTable, PolicyRecord};
pub use recording::{
    AudioFormat, AudioSource, AudioSourceChain, CapabilityTier, CaptureState, CatalogHandle,
    Duration, PendingRequest, RecordingSession,
};

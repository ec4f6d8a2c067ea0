//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod calls;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod notifier;
pub mod policy;

// Re-export common types
pub use calls::{CallEvent, CallTracker};
pub use capture::{CaptureBackend, CaptureError, CaptureHandle, CapturePermission};
pub use catalog::{CatalogError, MediaCatalog, OutputSink, RecordingIndex};
pub use config::ConfigStore;
pub use engine::{ConnectError, EngineConnector, RecorderService, RemoteError};
pub use notifier::{NotificationError, NotificationIcon, Notifier, RecorderNotice};
pub use policy::{CountryLocator, PolicySource};

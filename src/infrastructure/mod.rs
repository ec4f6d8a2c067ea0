//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like audio devices, the
//! filesystem and desktop notifications.

pub mod calls;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod notification;
pub mod policy;

// Re-export adapters
pub use calls::MemoryCallList;
pub use capture::{CpalCaptureBackend, InputDevicePermission};
pub use catalog::{FsCatalog, JsonRecordingIndex};
pub use config::XdgConfigStore;
pub use notification::{create_notifier, LogNotifier, NotifyRustNotifier};
pub use policy::{LocaleCountryLocator, TomlPolicySource};

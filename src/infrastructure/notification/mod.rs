//! Notification infrastructure module
//!
//! Provides desktop notifications using notify-rust, or log output
//! when notifications are turned off.

mod log_notifier;
mod notify_rust;

pub use log_notifier::LogNotifier;
pub use notify_rust::NotifyRustNotifier;

use std::sync::Arc;

use crate::application::ports::Notifier;

/// Create the notifier for the current settings
pub fn create_notifier(desktop: bool) -> Arc<dyn Notifier> {
    if desktop {
        Arc::new(NotifyRustNotifier::new())
    } else {
        Arc::new(LogNotifier::new())
    }
}

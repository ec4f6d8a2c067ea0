//! Notifier that writes notices to the log instead of the desktop

use async_trait::async_trait;
use tracing::{info, warn};

use crate::application::ports::{NotificationError, NotificationIcon, Notifier};

/// Used when desktop notifications are disabled or unavailable
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        match icon {
            NotificationIcon::Error | NotificationIcon::Warning => {
                warn!("{}: {}", title, message)
            }
            _ => info!("{}: {}", title, message),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::RecorderNotice;

    #[tokio::test]
    async fn log_notifier_never_fails() {
        let notifier = LogNotifier::new();
        assert!(notifier.notice(&RecorderNotice::Failed).await.is_ok());
    }
}

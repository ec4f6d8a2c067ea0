//! Desktop notices via notify-rust

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};

use crate::application::ports::{
    NotificationError, NotificationIcon, Notifier, RecorderNotice,
};

const APP_NAME: &str = "Call Recorder";

/// How insistently a notice is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emphasis {
    Low,
    Normal,
    Critical,
}

/// Display hints for one notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Presentation {
    emphasis: Emphasis,
    /// None keeps the notice until dismissed
    timeout_ms: Option<u32>,
}

impl Presentation {
    /// A failed recording stays on screen; transient states fade quickly
    fn for_notice(notice: &RecorderNotice) -> Self {
        match notice {
            RecorderNotice::Starting => Self {
                emphasis: Emphasis::Low,
                timeout_ms: Some(2_000),
            },
            RecorderNotice::Started => Self {
                emphasis: Emphasis::Normal,
                timeout_ms: Some(3_000),
            },
            RecorderNotice::Failed => Self {
                emphasis: Emphasis::Critical,
                timeout_ms: None,
            },
            RecorderNotice::FileSaved { .. } => Self {
                emphasis: Emphasis::Normal,
                timeout_ms: Some(6_000),
            },
        }
    }

    fn for_icon(icon: NotificationIcon) -> Self {
        let emphasis = match icon {
            NotificationIcon::Error => Emphasis::Critical,
            NotificationIcon::Info => Emphasis::Low,
            _ => Emphasis::Normal,
        };
        Self {
            emphasis,
            timeout_ms: Some(4_000),
        }
    }

    fn timeout(&self) -> Timeout {
        match self.timeout_ms {
            Some(ms) => Timeout::Milliseconds(ms),
            None => Timeout::Never,
        }
    }
}

/// Notifier backed by the host notification service
#[derive(Debug, Clone)]
pub struct NotifyRustNotifier {
    app_name: String,
}

impl NotifyRustNotifier {
    pub fn new() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
        }
    }

    async fn show(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
        presentation: Presentation,
    ) -> Result<(), NotificationError> {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(title)
            .body(message)
            .icon(icon.icon_name())
            .timeout(presentation.timeout());

        #[cfg(all(unix, not(target_os = "macos")))]
        notification.urgency(match presentation.emphasis {
            Emphasis::Low => notify_rust::Urgency::Low,
            Emphasis::Normal => notify_rust::Urgency::Normal,
            Emphasis::Critical => notify_rust::Urgency::Critical,
        });

        // The D-Bus round trip blocks
        tokio::task::spawn_blocking(move || {
            notification
                .show()
                .map(|_| ())
                .map_err(|e| NotificationError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::SendFailed(format!("Task join error: {}", e)))?
    }
}

impl Default for NotifyRustNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NotifyRustNotifier {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        self.show(title, message, icon, Presentation::for_icon(icon))
            .await
    }

    async fn notice(&self, notice: &RecorderNotice) -> Result<(), NotificationError> {
        self.show(
            notice.title(),
            &notice.message(),
            notice.icon(),
            Presentation::for_notice(notice),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_stays_until_dismissed() {
        let p = Presentation::for_notice(&RecorderNotice::Failed);
        assert_eq!(p.emphasis, Emphasis::Critical);
        assert_eq!(p.timeout(), Timeout::Never);
    }

    #[test]
    fn queued_start_is_low_and_brief() {
        let p = Presentation::for_notice(&RecorderNotice::Starting);
        assert_eq!(p.emphasis, Emphasis::Low);
        assert_eq!(p.timeout(), Timeout::Milliseconds(2_000));
    }

    #[test]
    fn saved_file_lingers_longer_than_started() {
        let saved = Presentation::for_notice(&RecorderNotice::FileSaved {
            artifact_name: "unknown_250101_120000000.flac".to_string(),
        });
        let started = Presentation::for_notice(&RecorderNotice::Started);
        assert!(saved.timeout_ms > started.timeout_ms);
    }

    #[test]
    fn plain_errors_are_critical() {
        assert_eq!(
            Presentation::for_icon(NotificationIcon::Error).emphasis,
            Emphasis::Critical
        );
        assert_eq!(
            Presentation::for_icon(NotificationIcon::Recording).emphasis,
            Emphasis::Normal
        );
    }

    #[test]
    fn default_app_name() {
        assert_eq!(NotifyRustNotifier::default().app_name, APP_NAME);
    }
}

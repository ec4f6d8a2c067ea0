//! Notification port interface

use async_trait::async_trait;
use thiserror::Error;

/// Notification errors
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Notification service unavailable")]
    Unavailable,

    #[error("Failed to show notification: {0}")]
    SendFailed(String),
}

/// Notification icon types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationIcon {
    Info,
    Success,
    Warning,
    Error,
    Recording,
}

impl NotificationIcon {
    /// Get the freedesktop icon name
    pub const fn icon_name(&self) -> &'static str {
        match self {
            Self::Info => "dialog-information",
            Self::Success => "dialog-ok",
            Self::Warning => "dialog-warning",
            Self::Error => "dialog-error",
            Self::Recording => "audio-input-microphone",
        }
    }
}

/// User-visible recorder notices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderNotice {
    /// Start queued while the engine connection is being established
    Starting,
    Started,
    Failed,
    /// Finished recording had no number to index it by
    FileSaved { artifact_name: String },
}

impl RecorderNotice {
    pub const fn title(&self) -> &'static str {
        "Call Recorder"
    }

    pub fn message(&self) -> String {
        match self {
            Self::Starting => "Recording starting...".to_string(),
            Self::Started => "Recording started".to_string(),
            Self::Failed => "Recording failed".to_string(),
            Self::FileSaved { artifact_name } => format!("File saved at {}", artifact_name),
        }
    }

    pub const fn icon(&self) -> NotificationIcon {
        match self {
            Self::Starting => NotificationIcon::Info,
            Self::Started => NotificationIcon::Recording,
            Self::Failed => NotificationIcon::Error,
            Self::FileSaved { .. } => NotificationIcon::Success,
        }
    }
}

/// Port for desktop notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show a desktop notification.
    ///
    /// # Arguments
    /// * `title` - The notification title
    /// * `message` - The notification body
    /// * `icon` - The icon to display
    ///
    /// # Returns
    /// Ok(()) on success, error otherwise
    async fn notify(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError>;

    /// Show a recorder notice
    async fn notice(&self, notice: &RecorderNotice) -> Result<(), NotificationError> {
        self.notify(notice.title(), &notice.message(), notice.icon())
            .await
    }
}

/// Blanket implementation for boxed notifier types
#[async_trait]
impl Notifier for Box<dyn Notifier> {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        self.as_ref().notify(title, message, icon).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_saved_names_artifact() {
        let notice = RecorderNotice::FileSaved {
            artifact_name: "unknown_250101_120000000.flac".to_string(),
        };
        assert_eq!(notice.message(), "File saved at unknown_250101_120000000.flac");
        assert_eq!(notice.icon(), NotificationIcon::Success);
    }

    #[test]
    fn failed_uses_error_icon() {
        assert_eq!(RecorderNotice::Failed.icon().icon_name(), "dialog-error");
    }
}

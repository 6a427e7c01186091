use serde::{Deserialize, Serialize};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Success,
    Error,
    Warning,
    Info,
}

/// A live notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    /// Lifetime in milliseconds; `0` keeps the notification until removed.
    pub duration: u64,
}

/// Input for [`NotificationCenter::add`](super::NotificationCenter::add).
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    /// `None` uses the center's default duration.
    pub duration: Option<u64>,
}

impl NewNotification {
    pub fn new(kind: NotificationType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration = Some(duration_ms);
        self
    }
}

/// Receives the full list of live notifications after every change.
pub trait NotificationListener: Send + Sync {
    fn on_change(&self, notifications: &[Notification]);
}

impl<F> NotificationListener for F
where
    F: Fn(&[Notification]) + Send + Sync,
{
    fn on_change(&self, notifications: &[Notification]) {
        self(notifications)
    }
}

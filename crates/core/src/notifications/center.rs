//! Publish/subscribe queue of short-lived user-facing messages.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use log::debug;
use tokio::time::Instant;
use uuid::Uuid;

use super::model::{NewNotification, Notification, NotificationListener, NotificationType};
use crate::constants::DEFAULT_NOTIFICATION_DURATION_MS;
use crate::runtime::{lock, ScheduledTask};

#[derive(Default)]
struct CenterState {
    notifications: Vec<Notification>,
    listeners: Vec<(u64, Arc<dyn NotificationListener>)>,
    next_listener_id: u64,
    expiries: Vec<ScheduledTask>,
}

struct CenterInner {
    default_duration_ms: u64,
    state: Mutex<CenterState>,
}

/// Broadcaster of notifications to every subscribed listener.
///
/// Cloning yields a handle to the same center. Expiry timers need a tokio
/// runtime; adding a notification with a non-zero duration outside one
/// panics like `tokio::spawn`.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<CenterInner>,
}

impl NotificationCenter {
    /// Creates a center using the default notification lifetime.
    pub fn init() -> Self {
        Self::with_default_duration(DEFAULT_NOTIFICATION_DURATION_MS)
    }

    pub fn with_default_duration(default_duration_ms: u64) -> Self {
        Self {
            inner: Arc::new(CenterInner {
                default_duration_ms,
                state: Mutex::new(CenterState::default()),
            }),
        }
    }

    /// Cancels pending expiries, drops every listener and clears the list.
    pub fn dispose(&self) {
        let expiries = {
            let mut state = lock(&self.inner.state);
            state.notifications.clear();
            state.listeners.clear();
            std::mem::take(&mut state.expiries)
        };
        debug!("Notification center disposed ({} pending expiries)", expiries.len());
        drop(expiries);
    }

    /// Publishes a notification and returns its id.
    pub fn add(&self, new: NewNotification) -> String {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            kind: new.kind,
            title: new.title,
            message: new.message,
            duration: new.duration.unwrap_or(self.inner.default_duration_ms),
        };
        let id = notification.id.clone();
        let duration = notification.duration;

        {
            let mut state = lock(&self.inner.state);
            state.notifications.push(notification);
            state.expiries.retain(|task| !task.is_finished());
            if duration > 0 {
                let deadline = Instant::now() + Duration::from_millis(duration);
                state
                    .expiries
                    .push(spawn_expiry(Arc::downgrade(&self.inner), id.clone(), deadline));
            }
        }

        self.notify();
        id
    }

    /// Removes the notification with `id`. Unknown ids are ignored.
    pub fn remove(&self, id: &str) {
        if remove_from(&self.inner, id) {
            self.notify();
        }
    }

    pub fn clear_all(&self) {
        lock(&self.inner.state).notifications.clear();
        self.notify();
    }

    /// Registers `listener`; it stays registered until the returned
    /// subscription is dropped or unsubscribed.
    pub fn subscribe(&self, listener: impl NotificationListener + 'static) -> Subscription {
        let mut state = lock(&self.inner.state);
        let id = state.next_listener_id;
        state.next_listener_id += 1;
        let listener: Arc<dyn NotificationListener> = Arc::new(listener);
        state.listeners.push((id, listener));
        Subscription {
            center: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        lock(&self.inner.state).notifications.clone()
    }

    pub fn success(&self, title: &str, message: &str, duration: Option<u64>) -> String {
        self.add_typed(NotificationType::Success, title, message, duration)
    }

    pub fn error(&self, title: &str, message: &str, duration: Option<u64>) -> String {
        self.add_typed(NotificationType::Error, title, message, duration)
    }

    pub fn warning(&self, title: &str, message: &str, duration: Option<u64>) -> String {
        self.add_typed(NotificationType::Warning, title, message, duration)
    }

    pub fn info(&self, title: &str, message: &str, duration: Option<u64>) -> String {
        self.add_typed(NotificationType::Info, title, message, duration)
    }

    fn add_typed(
        &self,
        kind: NotificationType,
        title: &str,
        message: &str,
        duration: Option<u64>,
    ) -> String {
        self.add(NewNotification {
            kind,
            title: title.to_string(),
            message: message.to_string(),
            duration,
        })
    }

    fn notify(&self) {
        notify(&self.inner);
    }
}

fn spawn_expiry(center: Weak<CenterInner>, id: String, deadline: Instant) -> ScheduledTask {
    ScheduledTask::spawn(async move {
        tokio::time::sleep_until(deadline).await;
        let Some(inner) = center.upgrade() else {
            return;
        };
        if remove_from(&inner, &id) {
            debug!("Notification {} expired", id);
            notify(&inner);
        }
    })
}

fn remove_from(inner: &CenterInner, id: &str) -> bool {
    let mut state = lock(&inner.state);
    let before = state.notifications.len();
    state.notifications.retain(|n| n.id != id);
    state.notifications.len() != before
}

/// Delivers the current list to every listener, outside the state lock.
fn notify(inner: &CenterInner) {
    let (notifications, listeners) = {
        let state = lock(&inner.state);
        let listeners: Vec<Arc<dyn NotificationListener>> = state
            .listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        (state.notifications.clone(), listeners)
    };
    for listener in listeners {
        listener.on_change(&notifications);
    }
}

/// Registration of a notification listener. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes the listener"]
pub struct Subscription {
    center: Weak<CenterInner>,
    id: u64,
}

impl Subscription {
    /// Deregisters the listener now rather than at drop.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.center.upgrade() {
            lock(&inner.state).listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

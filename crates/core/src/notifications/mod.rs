//! User-facing notifications with automatic expiry.

mod center;
mod model;

pub use center::{NotificationCenter, Subscription};
pub use model::{NewNotification, Notification, NotificationListener, NotificationType};

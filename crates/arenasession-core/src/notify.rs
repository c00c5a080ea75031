//! Notification capability used to surface outcomes to a human.
//!
//! The auth manager only decides *what* to say; a `Notifier` decides how it
//! is shown (toast, terminal line, log event).

use tracing::{info, warn};

/// Fixed user-facing texts.
pub mod messages {
    /// Shown after a reset request whether or not the email is registered.
    pub const RESET_REQUESTED: &str = "Check your email";
    pub const RESET_REQUEST_FAILED: &str = "We couldn't process that request. Please try again.";
    pub const SIGN_OUT_FAILED: &str = "Error logging out";
    pub const TRANSPORT_FAILED: &str = "Unable to reach the server. Please try again.";
    pub const REQUEST_FAILED: &str = "Request failed";
    pub const AUTHENTICATION_FAILED: &str = "Your session has expired. Please sign in again.";
    pub const STORAGE_FAILED: &str = "Couldn't save your session on this device";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Emits notifications as log events, for contexts without a human surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => info!(text = %notification.message, "notification"),
            NotificationLevel::Error => warn!(text = %notification.message, "notification"),
        }
    }
}

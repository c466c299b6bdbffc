//! Fire-and-forget user notifications (completion and error toasts).

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Severity::Info)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Severity::Error)
    }
}

/// Notification sink. Delivery failures are the sink's problem; callers
/// never wait on or inspect the result.
pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

/// Keeps every notification in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CollectingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.seen.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notification: &Notification) {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
    }
}

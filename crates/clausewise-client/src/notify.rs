//! User-visible notifications raised by the stores.
//!
//! Notifications are fire-and-forget: a notifier must never fail the
//! operation that raised it.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing::{error, info};

/// Sink for success and error toasts.
pub trait Notifier: Send + Sync + fmt::Debug {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Notifier that forwards to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(target: "clausewise::notify", "{}", message);
    }

    fn error(&self, message: &str) {
        error!(target: "clausewise::notify", "{}", message);
    }
}

/// One recorded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

/// Notifier that keeps every notification, for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Error(m) => Some(m),
                Notification::Success(_) => None,
            })
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Success(m) => Some(m),
                Notification::Error(_) => None,
            })
            .collect()
    }

    fn push(&self, event: Notification) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.push(Notification::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(Notification::Error(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.success("Logged in");
        notifier.error("Upload failed");
        notifier.success("Document deleted");

        assert_eq!(
            notifier.events(),
            vec![
                Notification::Success("Logged in".to_string()),
                Notification::Error("Upload failed".to_string()),
                Notification::Success("Document deleted".to_string()),
            ]
        );
        assert_eq!(notifier.errors(), vec!["Upload failed"]);
        assert_eq!(notifier.successes().len(), 2);
    }
}

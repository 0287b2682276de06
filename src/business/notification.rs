//! Issue change notifications

use std::cell::RefCell;
use tracing::info;

/// What changed on the issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    /// Files were attached
    Files,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::Files => "files",
        }
    }
}

/// A delivered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub issue_id: i64,
    pub notification_type: NotificationType,
    /// ID of the changed record, e.g. the attachment
    pub subject_id: i64,
    /// Only staff subscribers should hear about it
    pub internal_only: bool,
}

/// Delivers issue change notifications to subscribers
pub trait Notifier {
    fn notify(&self, issue_id: i64, notification_type: NotificationType, subject_id: i64, internal_only: bool);
}

/// Notifier that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, issue_id: i64, notification_type: NotificationType, subject_id: i64, internal_only: bool) {
        info!(
            issue_id,
            kind = notification_type.as_str(),
            subject_id,
            internal_only,
            "issue notification"
        );
    }
}

/// Notifier that keeps every notification it receives
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far
    pub fn notifications(&self) -> Vec<Notification> {
        self.sent.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, issue_id: i64, notification_type: NotificationType, subject_id: i64, internal_only: bool) {
        self.sent.borrow_mut().push(Notification {
            issue_id,
            notification_type,
            subject_id,
            internal_only,
        });
    }
}

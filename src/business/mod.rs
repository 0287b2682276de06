//! Business logic layer for the tracker
//!
//! This module provides the [`Tracker`] API: attachments, issue side
//! effects, resolutions, customer notes and custom fields.

pub mod tracker;
pub mod attachments;
pub mod issues;
pub mod users;
pub mod notification;
pub mod resolutions;
pub mod customer_notes;
pub mod custom_fields;

pub use tracker::{RequestContext, Tracker};
pub use attachments::Download;
pub use custom_fields::RankDirection;
pub use notification::{LogNotifier, Notification, NotificationType, Notifier, RecordingNotifier};

/// Outcome of a write operation
///
/// Controllers pick the user-facing message by the numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    /// The write went through
    Success = 1,
    /// A database operation failed
    Failed = -1,
    /// Input was rejected or the record is missing or not permitted
    Rejected = -2,
}

impl Code {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(value: i32) -> Option<Code> {
        match value {
            1 => Some(Code::Success),
            -1 => Some(Code::Failed),
            -2 => Some(Code::Rejected),
            _ => None,
        }
    }

    pub fn is_success(self) -> bool {
        self == Code::Success
    }
}

//! Data models for tracker database entities

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::TrackerError;

/// Stored minimum role of a custom field nobody sees
pub const NEVER_DISPLAY_ROLE: i64 = 9;

/// User role within a project, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Viewer = 1,
    Reporter = 2,
    Customer = 3,
    User = 4,
    Developer = 5,
    Manager = 6,
    Administrator = 7,
}

impl Role {
    /// Every role, least privileged first
    pub const ALL: [Role; 7] = [
        Role::Viewer,
        Role::Reporter,
        Role::Customer,
        Role::User,
        Role::Developer,
        Role::Manager,
        Role::Administrator,
    ];

    /// Numeric role ID as stored in the database
    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn from_id(id: i64) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.id() == id)
    }

    /// Display title
    pub fn title(self) -> &'static str {
        match self {
            Role::Viewer => "Viewer",
            Role::Reporter => "Reporter",
            Role::Customer => "Customer",
            Role::User => "Standard User",
            Role::Developer => "Developer",
            Role::Manager => "Manager",
            Role::Administrator => "Administrator",
        }
    }

    /// Customer-or-lower readers never see internal content
    pub fn is_customer_or_lower(self) -> bool {
        self <= Role::Customer
    }

    /// Manager-or-higher may act on other users' records
    pub fn is_manager_or_higher(self) -> bool {
        self >= Role::Manager
    }
}

/// Attachment visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentStatus {
    #[default]
    Public,
    Internal,
}

impl AttachmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttachmentStatus::Public => "public",
            AttachmentStatus::Internal => "internal",
        }
    }

    /// Status for an upload flagged internal-only or not
    pub fn from_internal_only(internal_only: bool) -> Self {
        if internal_only { AttachmentStatus::Internal } else { AttachmentStatus::Public }
    }
}

impl fmt::Display for AttachmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttachmentStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(AttachmentStatus::Public),
            "internal" => Ok(AttachmentStatus::Internal),
            other => Err(TrackerError::InvalidOperation(format!("Unknown attachment status: {}", other))),
        }
    }
}

/// Attachment metadata row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub iat_id: i64,
    pub issue_id: i64,
    /// Uploading user
    pub usr_id: i64,
    pub created_date: DateTime<Utc>,
    pub description: String,
    pub status: AttachmentStatus,
    /// Email of a sender without an account
    pub unknown_user: Option<String>,
    /// Note the attachment arrived with
    pub note_id: Option<i64>,
}

/// Attachment file metadata (blob excluded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentFile {
    pub iaf_id: i64,
    pub iat_id: i64,
    pub filename: String,
    pub filesize: i64,
    pub filetype: String,
}

/// Entry of an attachment's file listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileListEntry {
    pub iaf_id: i64,
    pub filename: String,
    pub filesize: i64,
    /// Human readable size, e.g. "1.50 KB"
    pub filesize_formatted: String,
}

/// Attachment as shown in an issue's attachment list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentListEntry {
    pub iat_id: i64,
    pub usr_id: i64,
    /// Uploader name, or the unknown sender's email when set
    pub usr_full_name: String,
    pub created_date: DateTime<Utc>,
    pub description: String,
    pub unknown_user: Option<String>,
    pub status: AttachmentStatus,
    pub files: Vec<FileListEntry>,
}

/// One file with its attachment and contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentDetails {
    pub attachment: Attachment,
    pub file: AttachmentFile,
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// File received with a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client supplied name; empty for unused upload slots
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: &str, mime_type: &str, data: &[u8]) -> Self {
        Self {
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            data: data.to_vec(),
        }
    }
}

/// Tracker user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub usr_id: i64,
    pub full_name: String,
    pub email: String,
}

/// Project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub prj_id: i64,
    pub title: String,
    /// CRM backend name; customer integration is on when set
    pub customer_backend: Option<String>,
}

/// Issue summary data used by attachment side effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub iss_id: i64,
    pub prj_id: i64,
    pub summary: String,
    pub res_id: Option<i64>,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
    pub last_customer_action_date: Option<DateTime<Utc>>,
}

/// Kind of issue history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryType {
    AttachmentAdded,
    AttachmentRemoved,
}

impl HistoryType {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryType::AttachmentAdded => "attachment_added",
            HistoryType::AttachmentRemoved => "attachment_removed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "attachment_added" => Some(HistoryType::AttachmentAdded),
            "attachment_removed" => Some(HistoryType::AttachmentRemoved),
            _ => None,
        }
    }
}

/// Issue history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub his_id: i64,
    pub issue_id: i64,
    pub usr_id: i64,
    pub history_type: HistoryType,
    pub summary: String,
    pub created_date: DateTime<Utc>,
}

/// Issue resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub res_id: i64,
    pub title: String,
    pub rank: i64,
    pub created_date: DateTime<Utc>,
}

/// Note kept about a customer of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerNote {
    pub cno_id: i64,
    pub prj_id: i64,
    /// Project title, filled in by list queries
    pub prj_title: Option<String>,
    pub customer_id: String,
    pub note: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
}

/// Custom field value type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldType {
    #[default]
    Text,
    Textarea,
    Combo,
    Multiple,
    Date,
    Integer,
}

impl CustomFieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomFieldType::Text => "text",
            CustomFieldType::Textarea => "textarea",
            CustomFieldType::Combo => "combo",
            CustomFieldType::Multiple => "multiple",
            CustomFieldType::Date => "date",
            CustomFieldType::Integer => "integer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(CustomFieldType::Text),
            "textarea" => Some(CustomFieldType::Textarea),
            "combo" => Some(CustomFieldType::Combo),
            "multiple" => Some(CustomFieldType::Multiple),
            "date" => Some(CustomFieldType::Date),
            "integer" => Some(CustomFieldType::Integer),
            _ => None,
        }
    }
}

/// Custom field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub fld_id: i64,
    pub title: String,
    pub description: String,
    pub field_type: CustomFieldType,
    pub rank: i64,
    /// Lowest role that sees the field; `None` hides it from everyone
    pub min_role: Option<Role>,
    /// Projects using the field
    pub projects: Vec<i64>,
}

/// Values for creating or updating a custom field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomFieldInput {
    pub title: String,
    pub description: String,
    pub field_type: CustomFieldType,
    /// `None` hides the field from everyone
    pub min_role: Option<Role>,
    pub projects: Vec<i64>,
}

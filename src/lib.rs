//! # trackcore
//!
//! Data and domain layer of a web issue tracker.
//!
//! ## Features
//!
//! - Database adapter selection by name with an offline fallback
//! - SQLite storage with prefixed table names
//! - Issue attachments with role-gated visibility
//! - Resolutions, customer notes and custom fields
//! - Message-ID and address helpers for mail handling
//! - Page controllers producing a template context
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use trackcore::{Connector, RequestContext, Role, Setup, Tracker, UploadedFile};
//! use trackcore::database::AttachmentStatus;
//!
//! let mut setup = Setup::load(Path::new("setup.toml")).unwrap();
//! let config = setup
//!     .database_config(Path::new("setup.toml"), |name| std::env::var(name).ok())
//!     .unwrap();
//!
//! let connector = Connector::new(config);
//! let tracker = Tracker::connect(&connector, RequestContext::new(1, 1, Role::Developer)).unwrap();
//! let files = [UploadedFile::new("trace.log", "text/plain", b"stack trace")];
//! let code = tracker.attach(1, 42, "crash logs", &files, AttachmentStatus::Public);
//! println!("attach returned {}", code.as_i32());
//! ```

pub mod business;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod mail;
pub mod utils;

// Re-export main types
pub use error::{TrackerError, Result};
pub use config::{AttachmentsConfig, DatabaseConfig, Setup};
pub use database::{Adapter, Connector, Role, UploadedFile};
pub use business::{Code, RequestContext, Tracker};
pub use controllers::{Controller, Page, Request};

/// Default upload limit in bytes
pub const DEFAULT_MAX_ATTACHMENT_SIZE: u64 = 2 * 1024 * 1024;

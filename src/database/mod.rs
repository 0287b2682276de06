//! Database layer for the tracker
//!
//! Handles database access including:
//! - Adapter selection with an offline fallback
//! - Table prefix substitution and identifier quoting
//! - Schema installation
//! - Queries for attachments, issues and admin records

pub mod adapter;
pub mod helper;
pub mod sqlite;
pub mod null;
pub mod models;
pub mod schema;
pub mod queries;

pub use adapter::{Adapter, Pairs, Row};
pub use helper::Connector;
pub use sqlite::SqliteAdapter;
pub use null::NullAdapter;
pub use models::*;
pub use rusqlite::types::Value;

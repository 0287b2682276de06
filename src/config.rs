//! Setup file handling
//!
//! The setup file is a TOML document with a `[database]` table describing
//! the adapter to use and an `[attachments]` table with upload limits.
//! Installations that predate the `[database]` table carry their connection
//! settings in `APP_SQL_*` environment variables; those are imported once
//! and written back to the setup file.

use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::error::{Result, TrackerError};
use crate::DEFAULT_MAX_ATTACHMENT_SIZE;

/// Database connection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Adapter name, e.g. "Sqlite", "SqliteAdapter" or legacy "DbSqlite"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classname: Option<String>,
    /// Driver name (informational for the SQLite adapter)
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub hostname: String,
    /// Database name; for SQLite the file path or ":memory:"
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Prefix substituted for `%` in `{{%table}}` tokens
    #[serde(default)]
    pub table_prefix: String,
}

impl DatabaseConfig {
    /// Config for a SQLite database at `database` with the given table prefix
    pub fn sqlite(database: &str, table_prefix: &str) -> Self {
        Self {
            classname: Some("Sqlite".to_string()),
            driver: "sqlite".to_string(),
            database: database.to_string(),
            table_prefix: table_prefix.to_string(),
            ..Self::default()
        }
    }

    /// Import settings from the legacy `APP_SQL_*` variables
    ///
    /// `lookup` resolves a variable name to its value; pass
    /// `|key| std::env::var(key).ok()` to read the process environment.
    pub fn from_legacy<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = lookup("APP_SQL_DBNAME").ok_or_else(|| {
            TrackerError::Config("APP_SQL_DBNAME is not set".to_string())
        })?;

        let port = match lookup("APP_SQL_DBPORT").filter(|p| !p.trim().is_empty()) {
            Some(p) => Some(p.trim().parse::<u16>().map_err(|_| {
                TrackerError::Config(format!("Invalid APP_SQL_DBPORT: {}", p))
            })?),
            None => None,
        };

        Ok(Self {
            classname: None,
            driver: lookup("APP_SQL_DBTYPE").unwrap_or_default(),
            hostname: lookup("APP_SQL_DBHOST").unwrap_or_default(),
            database,
            username: lookup("APP_SQL_DBUSER").unwrap_or_default(),
            password: lookup("APP_SQL_DBPASS").unwrap_or_default(),
            port,
            table_prefix: lookup("APP_TABLE_PREFIX").unwrap_or_default(),
        })
    }
}

/// Attachment upload settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentsConfig {
    /// Largest accepted file in bytes; 0 disables the check
    #[serde(default = "default_max_size")]
    pub max_size: u64,
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_ATTACHMENT_SIZE
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self { max_size: DEFAULT_MAX_ATTACHMENT_SIZE }
    }
}

/// Contents of the setup file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setup {
    /// Host name used in generated Message-IDs
    #[serde(default)]
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub attachments: AttachmentsConfig,
}

impl Setup {
    /// Load the setup file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse setup TOML
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Write the setup file
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Database settings, importing and saving legacy settings when absent
    pub fn database_config<F>(&mut self, path: &Path, lookup: F) -> Result<DatabaseConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(config) = &self.database {
            return Ok(config.clone());
        }

        let config = DatabaseConfig::from_legacy(lookup)?;
        self.database = Some(config.clone());
        self.save(path)?;
        info!(path = %path.display(), "imported legacy database settings into setup file");

        Ok(config)
    }
}

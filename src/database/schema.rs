//! Database schema definitions
//!
//! Table names use `{{%name}}` tokens so the configured prefix applies.

use tracing::info;
use crate::error::Result;
use super::adapter::Adapter;

/// SQL to create the users table
pub const CREATE_USER_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {{%user}} (
    usr_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    usr_full_name   VARCHAR(255) NOT NULL,
    usr_email       VARCHAR(255) NOT NULL UNIQUE,
    usr_lang        VARCHAR(5)
)
"#;

/// SQL to create the projects table
pub const CREATE_PROJECT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {{%project}} (
    prj_id               INTEGER PRIMARY KEY AUTOINCREMENT,
    prj_title            VARCHAR(64) NOT NULL UNIQUE,
    prj_customer_backend VARCHAR(64)
)
"#;

/// SQL to create the project membership table (role per project)
pub const CREATE_PROJECT_USER_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {{%project_user}} (
    pru_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    pru_prj_id      INTEGER NOT NULL,
    pru_usr_id      INTEGER NOT NULL,
    pru_role        INTEGER NOT NULL DEFAULT 1,
    UNIQUE (pru_prj_id, pru_usr_id)
)
"#;

/// SQL to create the issues table
pub const CREATE_ISSUE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {{%issue}} (
    iss_id                        INTEGER PRIMARY KEY AUTOINCREMENT,
    iss_prj_id                    INTEGER NOT NULL,
    iss_summary                   VARCHAR(128) NOT NULL DEFAULT '',
    iss_res_id                    INTEGER,
    iss_created_date              TEXT NOT NULL,
    iss_updated_date              TEXT,
    iss_last_customer_action_date TEXT
)
"#;

/// SQL to create the attachments table
pub const CREATE_ISSUE_ATTACHMENT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {{%issue_attachment}} (
    iat_id           INTEGER PRIMARY KEY AUTOINCREMENT,
    iat_iss_id       INTEGER NOT NULL,
    iat_usr_id       INTEGER NOT NULL,
    iat_created_date TEXT NOT NULL,
    iat_description  TEXT,
    iat_unknown_user VARCHAR(255),
    iat_status       VARCHAR(8) NOT NULL DEFAULT 'public'
                     CHECK (iat_status IN ('public', 'internal')),
    iat_not_id       INTEGER
)
"#;

/// SQL to create the attachment files table (blob storage)
pub const CREATE_ISSUE_ATTACHMENT_FILE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {{%issue_attachment_file}} (
    iaf_id           INTEGER PRIMARY KEY AUTOINCREMENT,
    iaf_iat_id       INTEGER NOT NULL,
    iaf_filename     VARCHAR(255) NOT NULL,
    iaf_filesize     INTEGER NOT NULL,
    iaf_filetype     VARCHAR(255),
    iaf_file         BLOB NOT NULL
)
"#;

/// SQL to index attachment files by attachment
pub const CREATE_ISSUE_ATTACHMENT_FILE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS {{%iaf_iat_id_idx}}
    ON {{%issue_attachment_file}} (iaf_iat_id)
"#;

/// SQL to create the issue history table
pub const CREATE_ISSUE_HISTORY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {{%issue_history}} (
    his_id           INTEGER PRIMARY KEY AUTOINCREMENT,
    his_iss_id       INTEGER NOT NULL,
    his_usr_id       INTEGER NOT NULL,
    his_type         VARCHAR(32) NOT NULL,
    his_summary      TEXT NOT NULL,
    his_created_date TEXT NOT NULL
)
"#;

/// SQL to create the resolutions table
pub const CREATE_RESOLUTION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {{%resolution}} (
    res_id           INTEGER PRIMARY KEY AUTOINCREMENT,
    res_title        VARCHAR(64) NOT NULL UNIQUE,
    res_rank         INTEGER NOT NULL DEFAULT 0,
    res_created_date TEXT NOT NULL
)
"#;

/// SQL to create the customer notes table
pub const CREATE_CUSTOMER_NOTE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {{%customer_note}} (
    cno_id           INTEGER PRIMARY KEY AUTOINCREMENT,
    cno_prj_id       INTEGER NOT NULL,
    cno_customer_id  VARCHAR(128) NOT NULL,
    cno_note         TEXT,
    cno_created_date TEXT NOT NULL,
    cno_updated_date TEXT,
    UNIQUE (cno_prj_id, cno_customer_id)
)
"#;

/// SQL to create the custom fields table
pub const CREATE_CUSTOM_FIELD_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {{%custom_field}} (
    fld_id           INTEGER PRIMARY KEY AUTOINCREMENT,
    fld_title        VARCHAR(32) NOT NULL,
    fld_description  VARCHAR(64),
    fld_type         VARCHAR(8) NOT NULL DEFAULT 'text',
    fld_rank         INTEGER NOT NULL DEFAULT 0,
    fld_min_role     INTEGER NOT NULL DEFAULT 1
)
"#;

/// SQL to create the project to custom field link table
pub const CREATE_PROJECT_CUSTOM_FIELD_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {{%project_custom_field}} (
    pcf_id           INTEGER PRIMARY KEY AUTOINCREMENT,
    pcf_prj_id       INTEGER NOT NULL,
    pcf_fld_id       INTEGER NOT NULL,
    UNIQUE (pcf_prj_id, pcf_fld_id)
)
"#;

/// All table creation statements in order
pub const CREATE_ALL_TABLES: &[&str] = &[
    CREATE_USER_TABLE,
    CREATE_PROJECT_TABLE,
    CREATE_PROJECT_USER_TABLE,
    CREATE_ISSUE_TABLE,
    CREATE_ISSUE_ATTACHMENT_TABLE,
    CREATE_ISSUE_ATTACHMENT_FILE_TABLE,
    CREATE_ISSUE_ATTACHMENT_FILE_INDEX,
    CREATE_ISSUE_HISTORY_TABLE,
    CREATE_RESOLUTION_TABLE,
    CREATE_CUSTOMER_NOTE_TABLE,
    CREATE_CUSTOM_FIELD_TABLE,
    CREATE_PROJECT_CUSTOM_FIELD_TABLE,
];

/// Create every table that does not exist yet
pub fn install(db: &dyn Adapter) -> Result<()> {
    for sql in CREATE_ALL_TABLES {
        db.query(sql, &[])?;
    }
    info!(prefix = db.table_prefix(), "schema installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::database::SqliteAdapter;

    #[test]
    fn test_install_is_idempotent() {
        let db = SqliteAdapter::connect(&DatabaseConfig::sqlite(":memory:", "ev_")).unwrap();
        install(&db).unwrap();
        install(&db).unwrap();

        let tables = db.get_column(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'ev_%' ORDER BY name",
            &[],
        ).unwrap();
        assert_eq!(tables.len(), 11);
    }

    #[test]
    fn test_status_constraint() {
        let db = SqliteAdapter::connect(&DatabaseConfig::sqlite(":memory:", "")).unwrap();
        install(&db).unwrap();
        let result = db.query(
            "INSERT INTO {{%issue_attachment}} (iat_iss_id, iat_usr_id, iat_created_date, iat_status)
             VALUES (1, 1, '2024-01-01 00:00:00', 'secret')",
            &[],
        );
        assert!(result.is_err());
    }
}

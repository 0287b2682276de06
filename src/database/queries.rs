//! SQL query operations for database access
//!
//! Free functions over any [`Adapter`]. They return typed errors; the
//! business layer turns those into result codes.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use crate::error::{Result, TrackerError};
use crate::utils::{format_datetime, now, parse_datetime};
use super::adapter::{Adapter, Row};
use super::helper::{build_list, build_set};
use super::models::{
    Attachment, AttachmentDetails, AttachmentFile, AttachmentStatus, CustomField,
    CustomFieldInput, CustomFieldType, CustomerNote, HistoryEntry, HistoryType, Issue,
    Project, Resolution, Role, User, NEVER_DISPLAY_ROLE,
};

/// Get current timestamp formatted for database
pub fn now_timestamp() -> String {
    format_datetime(&now())
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn opt_text(s: Option<&str>) -> Value {
    s.map_or(Value::Null, text)
}

fn id_values(ids: &[i64]) -> Vec<Value> {
    ids.iter().map(|id| Value::Integer(*id)).collect()
}

fn value_i64(value: Option<Value>) -> Option<i64> {
    match value? {
        Value::Integer(n) => Some(n),
        Value::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn row_string(row: &Row, column: &str) -> String {
    row.get_string(column).unwrap_or_default()
}

fn row_datetime(row: &Row, column: &str) -> Result<DateTime<Utc>> {
    row.get_string(column)
        .as_deref()
        .and_then(parse_datetime)
        .ok_or_else(|| TrackerError::Database(format!("Column {} is not a timestamp", column)))
}

fn row_opt_datetime(row: &Row, column: &str) -> Option<DateTime<Utc>> {
    row.get_string(column).as_deref().and_then(parse_datetime)
}

// ============================================================================
// Users and projects
// ============================================================================

/// Insert a user, returning its ID
pub fn insert_user(db: &dyn Adapter, full_name: &str, email: &str) -> Result<i64> {
    db.query(
        "INSERT INTO {{%user}} (usr_full_name, usr_email) VALUES (?, ?)",
        &[text(full_name), text(email)],
    )?;
    db.last_insert_id()
}

/// Get a user by ID
pub fn get_user(db: &dyn Adapter, usr_id: i64) -> Result<Option<User>> {
    let row = db.get_row(
        "SELECT usr_id, usr_full_name, usr_email FROM {{%user}} WHERE usr_id=?",
        &[Value::Integer(usr_id)],
    )?;
    row.map(|row| {
        Ok(User {
            usr_id: row.require_i64("usr_id")?,
            full_name: row_string(&row, "usr_full_name"),
            email: row_string(&row, "usr_email"),
        })
    })
    .transpose()
}

/// Get a user's full name
pub fn get_user_full_name(db: &dyn Adapter, usr_id: i64) -> Result<Option<String>> {
    let value = db.get_one(
        "SELECT usr_full_name FROM {{%user}} WHERE usr_id=?",
        &[Value::Integer(usr_id)],
    )?;
    Ok(match value {
        Some(Value::Text(name)) => Some(name),
        _ => None,
    })
}

/// Insert a project, returning its ID
pub fn insert_project(db: &dyn Adapter, title: &str, customer_backend: Option<&str>) -> Result<i64> {
    db.query(
        "INSERT INTO {{%project}} (prj_title, prj_customer_backend) VALUES (?, ?)",
        &[text(title), opt_text(customer_backend)],
    )?;
    db.last_insert_id()
}

fn project_from_row(row: &Row) -> Result<Project> {
    Ok(Project {
        prj_id: row.require_i64("prj_id")?,
        title: row_string(row, "prj_title"),
        customer_backend: row.get_string("prj_customer_backend").filter(|b| !b.is_empty()),
    })
}

/// Get a project by ID
pub fn get_project(db: &dyn Adapter, prj_id: i64) -> Result<Option<Project>> {
    let row = db.get_row(
        "SELECT prj_id, prj_title, prj_customer_backend FROM {{%project}} WHERE prj_id=?",
        &[Value::Integer(prj_id)],
    )?;
    row.as_ref().map(project_from_row).transpose()
}

/// Get all projects ordered by title
pub fn get_projects(db: &dyn Adapter) -> Result<Vec<Project>> {
    db.get_all(
        "SELECT prj_id, prj_title, prj_customer_backend FROM {{%project}} ORDER BY prj_title",
        &[],
    )?
    .iter()
    .map(project_from_row)
    .collect()
}

/// Set a user's role in a project, replacing any previous role
pub fn set_project_role(db: &dyn Adapter, prj_id: i64, usr_id: i64, role: Role) -> Result<()> {
    db.query(
        "INSERT OR REPLACE INTO {{%project_user}} (pru_prj_id, pru_usr_id, pru_role) VALUES (?, ?, ?)",
        &[Value::Integer(prj_id), Value::Integer(usr_id), Value::Integer(role.id())],
    )?;
    Ok(())
}

/// Get a user's role ID in a project
pub fn get_project_role(db: &dyn Adapter, usr_id: i64, prj_id: i64) -> Result<Option<i64>> {
    let value = db.get_one(
        "SELECT pru_role FROM {{%project_user}} WHERE pru_usr_id=? AND pru_prj_id=?",
        &[Value::Integer(usr_id), Value::Integer(prj_id)],
    )?;
    Ok(value_i64(value))
}

// ============================================================================
// Issues and history
// ============================================================================

/// Insert an issue, returning its ID
pub fn insert_issue(db: &dyn Adapter, prj_id: i64, summary: &str) -> Result<i64> {
    db.query(
        "INSERT INTO {{%issue}} (iss_prj_id, iss_summary, iss_created_date) VALUES (?, ?, ?)",
        &[Value::Integer(prj_id), text(summary), text(&now_timestamp())],
    )?;
    db.last_insert_id()
}

/// Get an issue by ID
pub fn get_issue(db: &dyn Adapter, iss_id: i64) -> Result<Option<Issue>> {
    let row = db.get_row(
        "SELECT iss_id, iss_prj_id, iss_summary, iss_res_id, iss_created_date,
                iss_updated_date, iss_last_customer_action_date
         FROM {{%issue}} WHERE iss_id=?",
        &[Value::Integer(iss_id)],
    )?;
    row.map(|row| {
        Ok(Issue {
            iss_id: row.require_i64("iss_id")?,
            prj_id: row.require_i64("iss_prj_id")?,
            summary: row_string(&row, "iss_summary"),
            res_id: row.get_i64("iss_res_id"),
            created_date: row_datetime(&row, "iss_created_date")?,
            updated_date: row_opt_datetime(&row, "iss_updated_date"),
            last_customer_action_date: row_opt_datetime(&row, "iss_last_customer_action_date"),
        })
    })
    .transpose()
}

/// Get the project an issue belongs to
pub fn get_issue_project_id(db: &dyn Adapter, iss_id: i64) -> Result<Option<i64>> {
    let value = db.get_one(
        "SELECT iss_prj_id FROM {{%issue}} WHERE iss_id=?",
        &[Value::Integer(iss_id)],
    )?;
    Ok(value_i64(value))
}

/// Set an issue's updated date
pub fn set_issue_updated(db: &dyn Adapter, iss_id: i64, timestamp: &str) -> Result<usize> {
    db.query(
        "UPDATE {{%issue}} SET iss_updated_date=? WHERE iss_id=?",
        &[text(timestamp), Value::Integer(iss_id)],
    )
}

/// Set an issue's last customer action date
pub fn set_issue_last_customer_action(db: &dyn Adapter, iss_id: i64, timestamp: &str) -> Result<usize> {
    db.query(
        "UPDATE {{%issue}} SET iss_last_customer_action_date=? WHERE iss_id=?",
        &[text(timestamp), Value::Integer(iss_id)],
    )
}

/// Set or clear an issue's resolution
pub fn set_issue_resolution(db: &dyn Adapter, iss_id: i64, res_id: Option<i64>) -> Result<usize> {
    db.query(
        "UPDATE {{%issue}} SET iss_res_id=? WHERE iss_id=?",
        &[res_id.map_or(Value::Null, Value::Integer), Value::Integer(iss_id)],
    )
}

/// Clear the resolution of every issue resolved with one of `res_ids`
pub fn clear_issue_resolutions(db: &dyn Adapter, res_ids: &[i64]) -> Result<usize> {
    if res_ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "UPDATE {{{{%issue}}}} SET iss_res_id=NULL WHERE iss_res_id IN ({})",
        build_list(res_ids)
    );
    db.query(&sql, &id_values(res_ids))
}

/// Insert a history entry, returning its ID
pub fn insert_history(
    db: &dyn Adapter,
    iss_id: i64,
    usr_id: i64,
    history_type: HistoryType,
    summary: &str,
) -> Result<i64> {
    db.query(
        "INSERT INTO {{%issue_history}} (his_iss_id, his_usr_id, his_type, his_summary, his_created_date)
         VALUES (?, ?, ?, ?, ?)",
        &[
            Value::Integer(iss_id),
            Value::Integer(usr_id),
            text(history_type.as_str()),
            text(summary),
            text(&now_timestamp()),
        ],
    )?;
    db.last_insert_id()
}

/// Get an issue's history, oldest first
pub fn get_history(db: &dyn Adapter, iss_id: i64) -> Result<Vec<HistoryEntry>> {
    let rows = db.get_all(
        "SELECT his_id, his_iss_id, his_usr_id, his_type, his_summary, his_created_date
         FROM {{%issue_history}} WHERE his_iss_id=? ORDER BY his_id ASC",
        &[Value::Integer(iss_id)],
    )?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let type_name = row_string(&row, "his_type");
        let history_type = HistoryType::parse(&type_name).ok_or_else(|| {
            TrackerError::Database(format!("Unknown history type: {}", type_name))
        })?;
        entries.push(HistoryEntry {
            his_id: row.require_i64("his_id")?,
            issue_id: row.require_i64("his_iss_id")?,
            usr_id: row.require_i64("his_usr_id")?,
            history_type,
            summary: row_string(&row, "his_summary"),
            created_date: row_datetime(&row, "his_created_date")?,
        });
    }
    Ok(entries)
}

// ============================================================================
// Attachments
// ============================================================================

/// Insert an attachment row, returning its ID
pub fn insert_attachment(
    db: &dyn Adapter,
    iss_id: i64,
    usr_id: i64,
    description: &str,
    status: AttachmentStatus,
    unknown_user: Option<&str>,
    note_id: Option<i64>,
) -> Result<i64> {
    db.query(
        "INSERT INTO {{%issue_attachment}}
            (iat_iss_id, iat_usr_id, iat_created_date, iat_description, iat_status, iat_unknown_user, iat_not_id)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        &[
            Value::Integer(iss_id),
            Value::Integer(usr_id),
            text(&now_timestamp()),
            text(description),
            text(status.as_str()),
            opt_text(unknown_user),
            note_id.map_or(Value::Null, Value::Integer),
        ],
    )?;
    db.last_insert_id()
}

/// Insert a file row, sized from the blob, returning its ID
pub fn insert_attachment_file(
    db: &dyn Adapter,
    iat_id: i64,
    filename: &str,
    filetype: &str,
    blob: &[u8],
) -> Result<i64> {
    db.query(
        "INSERT INTO {{%issue_attachment_file}} (iaf_iat_id, iaf_filename, iaf_filesize, iaf_filetype, iaf_file)
         VALUES (?, ?, ?, ?, ?)",
        &[
            Value::Integer(iat_id),
            text(filename),
            Value::Integer(blob.len() as i64),
            text(filetype),
            Value::Blob(blob.to_vec()),
        ],
    )?;
    db.last_insert_id()
}

fn attachment_from_row(row: &Row) -> Result<Attachment> {
    let status = row_string(row, "iat_status").parse()?;
    Ok(Attachment {
        iat_id: row.require_i64("iat_id")?,
        issue_id: row.require_i64("iat_iss_id")?,
        usr_id: row.require_i64("iat_usr_id")?,
        created_date: row_datetime(row, "iat_created_date")?,
        description: row_string(row, "iat_description"),
        status,
        unknown_user: row.get_string("iat_unknown_user").filter(|u| !u.is_empty()),
        note_id: row.get_i64("iat_not_id"),
    })
}

fn attachment_file_from_row(row: &Row) -> Result<AttachmentFile> {
    Ok(AttachmentFile {
        iaf_id: row.require_i64("iaf_id")?,
        iat_id: row.require_i64("iaf_iat_id")?,
        filename: row_string(row, "iaf_filename"),
        filesize: row.get_i64("iaf_filesize").unwrap_or(0),
        filetype: row_string(row, "iaf_filetype"),
    })
}

/// Get an attachment row by ID
pub fn get_attachment(db: &dyn Adapter, iat_id: i64) -> Result<Option<Attachment>> {
    let row = db.get_row(
        "SELECT * FROM {{%issue_attachment}} WHERE iat_id=?",
        &[Value::Integer(iat_id)],
    )?;
    row.as_ref().map(attachment_from_row).transpose()
}

/// Issue of an attachment, restricted to `owner`'s uploads when given
pub fn get_attachment_issue_id(db: &dyn Adapter, iat_id: i64, owner: Option<i64>) -> Result<Option<i64>> {
    let mut sql = String::from("SELECT iat_iss_id FROM {{%issue_attachment}} WHERE iat_id=?");
    let mut params = vec![Value::Integer(iat_id)];
    if let Some(usr_id) = owner {
        sql.push_str(" AND iat_usr_id=?");
        params.push(Value::Integer(usr_id));
    }
    Ok(value_i64(db.get_one(&sql, &params)?))
}

/// Issue of a file's attachment, restricted to `owner`'s uploads when given
pub fn get_file_issue_id(db: &dyn Adapter, iaf_id: i64, owner: Option<i64>) -> Result<Option<i64>> {
    let mut sql = String::from(
        "SELECT iat_iss_id FROM {{%issue_attachment}}, {{%issue_attachment_file}}
         WHERE iaf_id=? AND iat_id=iaf_iat_id",
    );
    let mut params = vec![Value::Integer(iaf_id)];
    if let Some(usr_id) = owner {
        sql.push_str(" AND iat_usr_id=?");
        params.push(Value::Integer(usr_id));
    }
    Ok(value_i64(db.get_one(&sql, &params)?))
}

/// Attachment a file belongs to
pub fn get_file_attachment_id(db: &dyn Adapter, iaf_id: i64) -> Result<Option<i64>> {
    let value = db.get_one(
        "SELECT iaf_iat_id FROM {{%issue_attachment_file}} WHERE iaf_id=?",
        &[Value::Integer(iaf_id)],
    )?;
    Ok(value_i64(value))
}

/// Files of an attachment in upload order (blobs excluded)
pub fn get_attachment_files(db: &dyn Adapter, iat_id: i64) -> Result<Vec<AttachmentFile>> {
    db.get_all(
        "SELECT iaf_id, iaf_iat_id, iaf_filename, iaf_filesize, iaf_filetype
         FROM {{%issue_attachment_file}} WHERE iaf_iat_id=? ORDER BY iaf_id ASC",
        &[Value::Integer(iat_id)],
    )?
    .iter()
    .map(attachment_file_from_row)
    .collect()
}

/// Delete an attachment row of the given issue
pub fn delete_attachment(db: &dyn Adapter, iat_id: i64, iss_id: i64) -> Result<usize> {
    db.query(
        "DELETE FROM {{%issue_attachment}} WHERE iat_id=? AND iat_iss_id=?",
        &[Value::Integer(iat_id), Value::Integer(iss_id)],
    )
}

/// Delete a single file row
pub fn delete_attachment_file(db: &dyn Adapter, iaf_id: i64) -> Result<usize> {
    db.query(
        "DELETE FROM {{%issue_attachment_file}} WHERE iaf_id=?",
        &[Value::Integer(iaf_id)],
    )
}

/// Attachment IDs of the given issues
pub fn get_issue_attachment_ids(db: &dyn Adapter, iss_ids: &[i64]) -> Result<Vec<i64>> {
    if iss_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT iat_id FROM {{{{%issue_attachment}}}} WHERE iat_iss_id IN ({}) ORDER BY iat_id",
        build_list(iss_ids)
    );
    Ok(db.get_column(&sql, &id_values(iss_ids))?
        .into_iter()
        .filter_map(|v| value_i64(Some(v)))
        .collect())
}

/// Attachment row joined with its uploader's name
#[derive(Debug, Clone)]
pub struct RawAttachmentRow {
    pub attachment: Attachment,
    pub usr_full_name: String,
}

/// Attachments of an issue, oldest first
pub fn get_attachment_list(db: &dyn Adapter, iss_id: i64, public_only: bool) -> Result<Vec<RawAttachmentRow>> {
    let mut sql = String::from(
        "SELECT iat_id, iat_iss_id, iat_usr_id, usr_full_name, iat_created_date, iat_description,
                iat_unknown_user, iat_status, iat_not_id
         FROM {{%issue_attachment}}, {{%user}}
         WHERE iat_iss_id=? AND iat_usr_id=usr_id",
    );
    let mut params = vec![Value::Integer(iss_id)];
    if public_only {
        sql.push_str(" AND iat_status=?");
        params.push(text(AttachmentStatus::Public.as_str()));
    }
    sql.push_str(" ORDER BY iat_created_date ASC, iat_id ASC");

    db.get_all(&sql, &params)?
        .iter()
        .map(|row| {
            Ok(RawAttachmentRow {
                attachment: attachment_from_row(row)?,
                usr_full_name: row_string(row, "usr_full_name"),
            })
        })
        .collect()
}

/// A file joined with its attachment, including the blob
pub fn get_attachment_details(db: &dyn Adapter, iaf_id: i64) -> Result<Option<AttachmentDetails>> {
    let row = db.get_row(
        "SELECT * FROM {{%issue_attachment}}, {{%issue_attachment_file}}
         WHERE iat_id=iaf_iat_id AND iaf_id=?",
        &[Value::Integer(iaf_id)],
    )?;
    row.map(|row| {
        Ok(AttachmentDetails {
            attachment: attachment_from_row(&row)?,
            file: attachment_file_from_row(&row)?,
            data: row.get_blob("iaf_file").unwrap_or_default(),
        })
    })
    .transpose()
}

// ============================================================================
// Resolutions
// ============================================================================

fn resolution_from_row(row: &Row) -> Result<Resolution> {
    Ok(Resolution {
        res_id: row.require_i64("res_id")?,
        title: row_string(row, "res_title"),
        rank: row.get_i64("res_rank").unwrap_or(0),
        created_date: row_datetime(row, "res_created_date")?,
    })
}

/// Insert a resolution, returning its ID
pub fn insert_resolution(db: &dyn Adapter, title: &str, rank: i64) -> Result<i64> {
    db.query(
        "INSERT INTO {{%resolution}} (res_title, res_rank, res_created_date) VALUES (?, ?, ?)",
        &[text(title), Value::Integer(rank), text(&now_timestamp())],
    )?;
    db.last_insert_id()
}

/// Update a resolution's title and rank
pub fn update_resolution(db: &dyn Adapter, res_id: i64, title: &str, rank: i64) -> Result<usize> {
    let sql = format!(
        "UPDATE {{{{%resolution}}}} SET {} WHERE res_id=?",
        build_set(&["res_title", "res_rank"])
    );
    db.query(&sql, &[text(title), Value::Integer(rank), Value::Integer(res_id)])
}

/// Delete resolutions by ID
pub fn delete_resolutions(db: &dyn Adapter, res_ids: &[i64]) -> Result<usize> {
    if res_ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "DELETE FROM {{{{%resolution}}}} WHERE res_id IN ({})",
        build_list(res_ids)
    );
    db.query(&sql, &id_values(res_ids))
}

/// Get a resolution by ID
pub fn get_resolution(db: &dyn Adapter, res_id: i64) -> Result<Option<Resolution>> {
    let row = db.get_row(
        "SELECT res_id, res_title, res_rank, res_created_date FROM {{%resolution}} WHERE res_id=?",
        &[Value::Integer(res_id)],
    )?;
    row.as_ref().map(resolution_from_row).transpose()
}

/// All resolutions ordered by rank, then title
pub fn get_resolutions(db: &dyn Adapter) -> Result<Vec<Resolution>> {
    db.get_all(
        "SELECT res_id, res_title, res_rank, res_created_date FROM {{%resolution}} ORDER BY res_rank ASC, res_title ASC",
        &[],
    )?
    .iter()
    .map(resolution_from_row)
    .collect()
}

/// Resolution ID to title, ordered by rank
pub fn get_resolution_titles(db: &dyn Adapter) -> Result<Vec<(i64, String)>> {
    let pairs = db.get_pair(
        "SELECT res_id, res_title FROM {{%resolution}} ORDER BY res_rank ASC, res_title ASC",
        &[],
    )?;
    Ok(pairs
        .into_iter()
        .filter_map(|(id, title)| match (id, title) {
            (Value::Integer(id), Value::Text(title)) => Some((id, title)),
            _ => None,
        })
        .collect())
}

// ============================================================================
// Customer notes
// ============================================================================

fn customer_note_from_row(row: &Row) -> Result<CustomerNote> {
    Ok(CustomerNote {
        cno_id: row.require_i64("cno_id")?,
        prj_id: row.require_i64("cno_prj_id")?,
        prj_title: row.get_string("prj_title"),
        customer_id: row_string(row, "cno_customer_id"),
        note: row_string(row, "cno_note"),
        created_date: row_datetime(row, "cno_created_date")?,
        updated_date: row_opt_datetime(row, "cno_updated_date"),
    })
}

/// Insert a customer note, returning its ID
pub fn insert_customer_note(db: &dyn Adapter, prj_id: i64, customer_id: &str, note: &str) -> Result<i64> {
    db.query(
        "INSERT INTO {{%customer_note}} (cno_prj_id, cno_customer_id, cno_note, cno_created_date)
         VALUES (?, ?, ?, ?)",
        &[Value::Integer(prj_id), text(customer_id), text(note), text(&now_timestamp())],
    )?;
    db.last_insert_id()
}

/// Update a customer note
pub fn update_customer_note(
    db: &dyn Adapter,
    cno_id: i64,
    prj_id: i64,
    customer_id: &str,
    note: &str,
) -> Result<usize> {
    let sql = format!(
        "UPDATE {{{{%customer_note}}}} SET {} WHERE cno_id=?",
        build_set(&["cno_prj_id", "cno_customer_id", "cno_note", "cno_updated_date"])
    );
    db.query(
        &sql,
        &[
            Value::Integer(prj_id),
            text(customer_id),
            text(note),
            text(&now_timestamp()),
            Value::Integer(cno_id),
        ],
    )
}

/// Delete customer notes by ID
pub fn delete_customer_notes(db: &dyn Adapter, cno_ids: &[i64]) -> Result<usize> {
    if cno_ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "DELETE FROM {{{{%customer_note}}}} WHERE cno_id IN ({})",
        build_list(cno_ids)
    );
    db.query(&sql, &id_values(cno_ids))
}

const CUSTOMER_NOTE_SELECT: &str =
    "SELECT cno_id, cno_prj_id, prj_title, cno_customer_id, cno_note, cno_created_date, cno_updated_date
     FROM {{%customer_note}} LEFT JOIN {{%project}} ON prj_id=cno_prj_id";

/// Get a customer note by ID
pub fn get_customer_note(db: &dyn Adapter, cno_id: i64) -> Result<Option<CustomerNote>> {
    let sql = format!("{} WHERE cno_id=?", CUSTOMER_NOTE_SELECT);
    let row = db.get_row(&sql, &[Value::Integer(cno_id)])?;
    row.as_ref().map(customer_note_from_row).transpose()
}

/// Get the note kept for a customer in a project
pub fn get_customer_note_by_customer(db: &dyn Adapter, prj_id: i64, customer_id: &str) -> Result<Option<CustomerNote>> {
    let sql = format!("{} WHERE cno_prj_id=? AND cno_customer_id=?", CUSTOMER_NOTE_SELECT);
    let row = db.get_row(&sql, &[Value::Integer(prj_id), text(customer_id)])?;
    row.as_ref().map(customer_note_from_row).transpose()
}

/// All customer notes ordered by project title, then customer
pub fn get_customer_notes(db: &dyn Adapter) -> Result<Vec<CustomerNote>> {
    let sql = format!("{} ORDER BY prj_title ASC, cno_customer_id ASC", CUSTOMER_NOTE_SELECT);
    db.get_all(&sql, &[])?
        .iter()
        .map(customer_note_from_row)
        .collect()
}

// ============================================================================
// Custom fields
// ============================================================================

fn custom_field_from_row(db: &dyn Adapter, row: &Row) -> Result<CustomField> {
    let fld_id = row.require_i64("fld_id")?;
    let type_name = row_string(row, "fld_type");
    let field_type = CustomFieldType::parse(&type_name).ok_or_else(|| {
        TrackerError::Database(format!("Unknown custom field type: {}", type_name))
    })?;
    let min_role = row.get_i64("fld_min_role").and_then(Role::from_id);

    Ok(CustomField {
        fld_id,
        title: row_string(row, "fld_title"),
        description: row_string(row, "fld_description"),
        field_type,
        rank: row.get_i64("fld_rank").unwrap_or(0),
        min_role,
        projects: get_custom_field_projects(db, fld_id)?,
    })
}

/// Highest rank in use, 0 when there are no fields
pub fn max_custom_field_rank(db: &dyn Adapter) -> Result<i64> {
    let value = db.get_one("SELECT MAX(fld_rank) FROM {{%custom_field}}", &[])?;
    Ok(value_i64(value).unwrap_or(0))
}

/// Insert a custom field at `rank`, returning its ID
pub fn insert_custom_field(db: &dyn Adapter, input: &CustomFieldInput, rank: i64) -> Result<i64> {
    db.query(
        "INSERT INTO {{%custom_field}} (fld_title, fld_description, fld_type, fld_rank, fld_min_role)
         VALUES (?, ?, ?, ?, ?)",
        &[
            text(&input.title),
            text(&input.description),
            text(input.field_type.as_str()),
            Value::Integer(rank),
            Value::Integer(input.min_role.map_or(NEVER_DISPLAY_ROLE, Role::id)),
        ],
    )?;
    db.last_insert_id()
}

/// Update a custom field's definition
pub fn update_custom_field(db: &dyn Adapter, fld_id: i64, input: &CustomFieldInput) -> Result<usize> {
    let sql = format!(
        "UPDATE {{{{%custom_field}}}} SET {} WHERE fld_id=?",
        build_set(&["fld_title", "fld_description", "fld_type", "fld_min_role"])
    );
    db.query(
        &sql,
        &[
            text(&input.title),
            text(&input.description),
            text(input.field_type.as_str()),
            Value::Integer(input.min_role.map_or(NEVER_DISPLAY_ROLE, Role::id)),
            Value::Integer(fld_id),
        ],
    )
}

/// Set a custom field's rank
pub fn set_custom_field_rank(db: &dyn Adapter, fld_id: i64, rank: i64) -> Result<usize> {
    db.query(
        "UPDATE {{%custom_field}} SET fld_rank=? WHERE fld_id=?",
        &[Value::Integer(rank), Value::Integer(fld_id)],
    )
}

/// Delete custom fields by ID
pub fn delete_custom_fields(db: &dyn Adapter, fld_ids: &[i64]) -> Result<usize> {
    if fld_ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "DELETE FROM {{{{%custom_field}}}} WHERE fld_id IN ({})",
        build_list(fld_ids)
    );
    db.query(&sql, &id_values(fld_ids))
}

/// Remove the project links of the given custom fields
pub fn delete_custom_field_projects(db: &dyn Adapter, fld_ids: &[i64]) -> Result<usize> {
    if fld_ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "DELETE FROM {{{{%project_custom_field}}}} WHERE pcf_fld_id IN ({})",
        build_list(fld_ids)
    );
    db.query(&sql, &id_values(fld_ids))
}

/// Link a custom field to each of `projects`
pub fn add_custom_field_projects(db: &dyn Adapter, fld_id: i64, projects: &[i64]) -> Result<()> {
    for prj_id in projects {
        db.query(
            "INSERT OR IGNORE INTO {{%project_custom_field}} (pcf_prj_id, pcf_fld_id) VALUES (?, ?)",
            &[Value::Integer(*prj_id), Value::Integer(fld_id)],
        )?;
    }
    Ok(())
}

/// Projects a custom field is linked to
pub fn get_custom_field_projects(db: &dyn Adapter, fld_id: i64) -> Result<Vec<i64>> {
    Ok(db
        .get_column(
            "SELECT pcf_prj_id FROM {{%project_custom_field}} WHERE pcf_fld_id=? ORDER BY pcf_prj_id",
            &[Value::Integer(fld_id)],
        )?
        .into_iter()
        .filter_map(|v| value_i64(Some(v)))
        .collect())
}

/// Get a custom field by ID
pub fn get_custom_field(db: &dyn Adapter, fld_id: i64) -> Result<Option<CustomField>> {
    let row = db.get_row(
        "SELECT * FROM {{%custom_field}} WHERE fld_id=?",
        &[Value::Integer(fld_id)],
    )?;
    row.map(|row| custom_field_from_row(db, &row)).transpose()
}

/// All custom fields ordered by rank
pub fn get_custom_fields(db: &dyn Adapter) -> Result<Vec<CustomField>> {
    let rows = db.get_all("SELECT * FROM {{%custom_field}} ORDER BY fld_rank ASC, fld_id ASC", &[])?;
    rows.iter().map(|row| custom_field_from_row(db, row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::database::{schema, SqliteAdapter};

    fn create_test_db() -> SqliteAdapter {
        let db = SqliteAdapter::connect(&DatabaseConfig::sqlite(":memory:", "ev_")).unwrap();
        schema::install(&db).unwrap();
        db
    }

    #[test]
    fn test_user_and_role() {
        let db = create_test_db();
        let usr_id = insert_user(&db, "Admin User", "admin@example.com").unwrap();
        let prj_id = insert_project(&db, "Default Project", None).unwrap();

        assert_eq!(get_user_full_name(&db, usr_id).unwrap().as_deref(), Some("Admin User"));
        assert_eq!(get_user_full_name(&db, 99).unwrap(), None);
        assert_eq!(get_project_role(&db, usr_id, prj_id).unwrap(), None);

        set_project_role(&db, prj_id, usr_id, Role::Developer).unwrap();
        set_project_role(&db, prj_id, usr_id, Role::Manager).unwrap();
        assert_eq!(get_project_role(&db, usr_id, prj_id).unwrap(), Some(6));
    }

    #[test]
    fn test_issue_dates() {
        let db = create_test_db();
        let prj_id = insert_project(&db, "Default Project", Some("example")).unwrap();
        let iss_id = insert_issue(&db, prj_id, "Crash on save").unwrap();

        let issue = get_issue(&db, iss_id).unwrap().unwrap();
        assert!(issue.updated_date.is_none());

        set_issue_updated(&db, iss_id, "2024-03-01 10:00:00").unwrap();
        let issue = get_issue(&db, iss_id).unwrap().unwrap();
        assert_eq!(issue.updated_date.map(|d| format_datetime(&d)).as_deref(), Some("2024-03-01 10:00:00"));
        assert_eq!(get_issue_project_id(&db, iss_id).unwrap(), Some(prj_id));
        assert_eq!(get_project(&db, prj_id).unwrap().unwrap().customer_backend.as_deref(), Some("example"));
    }

    #[test]
    fn test_attachment_owner_filter() {
        let db = create_test_db();
        let iat_id = insert_attachment(&db, 7, 2, "logs", AttachmentStatus::Public, None, None).unwrap();
        let iaf_id = insert_attachment_file(&db, iat_id, "log.txt", "text/plain", b"hello").unwrap();

        assert_eq!(get_attachment_issue_id(&db, iat_id, None).unwrap(), Some(7));
        assert_eq!(get_attachment_issue_id(&db, iat_id, Some(2)).unwrap(), Some(7));
        assert_eq!(get_attachment_issue_id(&db, iat_id, Some(3)).unwrap(), None);
        assert_eq!(get_file_issue_id(&db, iaf_id, Some(3)).unwrap(), None);
        assert_eq!(get_file_attachment_id(&db, iaf_id).unwrap(), Some(iat_id));

        let files = get_attachment_files(&db, iat_id).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filesize, 5);
    }

    #[test]
    fn test_attachment_details_include_blob() {
        let db = create_test_db();
        let iat_id = insert_attachment(&db, 1, 1, "", AttachmentStatus::Internal, Some("someone@example.com"), Some(4)).unwrap();
        let iaf_id = insert_attachment_file(&db, iat_id, "a.bin", "", &[0, 1, 2]).unwrap();

        let details = get_attachment_details(&db, iaf_id).unwrap().unwrap();
        assert_eq!(details.data, vec![0, 1, 2]);
        assert_eq!(details.attachment.status, AttachmentStatus::Internal);
        assert_eq!(details.attachment.unknown_user.as_deref(), Some("someone@example.com"));
        assert_eq!(details.attachment.note_id, Some(4));
        assert!(get_attachment_details(&db, iaf_id + 1).unwrap().is_none());
    }

    #[test]
    fn test_resolutions_order_and_clear() {
        let db = create_test_db();
        let fixed = insert_resolution(&db, "fixed", 2).unwrap();
        let wontfix = insert_resolution(&db, "won't fix", 1).unwrap();

        let titles = get_resolution_titles(&db).unwrap();
        assert_eq!(titles, vec![(wontfix, "won't fix".to_string()), (fixed, "fixed".to_string())]);

        let iss_id = insert_issue(&db, 1, "x").unwrap();
        set_issue_resolution(&db, iss_id, Some(fixed)).unwrap();
        assert_eq!(clear_issue_resolutions(&db, &[fixed]).unwrap(), 1);
        assert_eq!(get_issue(&db, iss_id).unwrap().unwrap().res_id, None);
        assert_eq!(clear_issue_resolutions(&db, &[]).unwrap(), 0);
    }

    #[test]
    fn test_custom_field_projects() {
        let db = create_test_db();
        let input = CustomFieldInput {
            title: "Browser".into(),
            field_type: CustomFieldType::Combo,
            projects: vec![1, 2],
            ..Default::default()
        };
        let fld_id = insert_custom_field(&db, &input, 1).unwrap();
        add_custom_field_projects(&db, fld_id, &input.projects).unwrap();

        let field = get_custom_field(&db, fld_id).unwrap().unwrap();
        assert_eq!(field.projects, vec![1, 2]);
        assert_eq!(field.field_type, CustomFieldType::Combo);
        assert_eq!(max_custom_field_rank(&db).unwrap(), 1);

        delete_custom_field_projects(&db, &[fld_id]).unwrap();
        assert!(get_custom_field_projects(&db, fld_id).unwrap().is_empty());
    }
}

//! Attachment operations
//!
//! An attachment groups one or more uploaded files on an issue. It is
//! written together with its files in one transaction and deleted when its
//! last file goes. Internal attachments are hidden from customer-or-lower
//! readers.

use tracing::{info, warn};
use crate::database::{
    queries, AttachmentDetails, AttachmentListEntry, AttachmentStatus, FileListEntry,
    HistoryType, Role, UploadedFile,
};
use crate::error::Result;
use crate::utils::{format_file_size, rawurlencode, urlencode};
use super::Code;
use super::notification::NotificationType;
use super::tracker::Tracker;

/// Mime type used when a file has none
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Filename used when a file has none
pub const UNTITLED: &str = "Untitled";

/// Headers and body for serving a stored file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Images and text display in the browser
fn display_inline(mimetype: &str) -> bool {
    match mimetype.split_once('/') {
        Some((kind, _)) => kind == "image" || kind == "text",
        None => false,
    }
}

impl Download {
    /// Build the response for a file
    ///
    /// `force_inline` serves the file as plain text in the browser; gzip
    /// files keep their encoding so the browser unpacks them.
    pub fn new(data: Vec<u8>, filename: &str, filesize: i64, mimetype: &str, force_inline: bool) -> Self {
        let mut headers = Vec::with_capacity(4);

        if force_inline {
            headers.push(("Content-Type".to_string(), "text/plain".to_string()));
            if mimetype.to_ascii_lowercase().contains("gzip") {
                headers.push(("Content-Encoding".to_string(), "gzip".to_string()));
            }
            headers.push((
                "Content-Disposition".to_string(),
                format!("inline; filename=\"{}\"", urlencode(filename)),
            ));
        } else {
            let mimetype = if mimetype.is_empty() { DEFAULT_MIME_TYPE } else { mimetype };
            let filename = if filename.is_empty() { UNTITLED } else { filename };
            let disposition = if display_inline(mimetype) { "inline" } else { "attachment" };
            let encoded = rawurlencode(filename);

            headers.push(("Content-Type".to_string(), mimetype.to_string()));
            headers.push((
                "Content-Disposition".to_string(),
                format!("{}; filename=\"{}\"; filename*=UTF-8''{}", disposition, encoded, encoded),
            ));
        }
        headers.push(("Content-Length".to_string(), filesize.to_string()));

        Self { headers, body: data }
    }

    /// First header named `name`, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl Tracker {
    /// Users below Manager may only touch their own uploads
    fn owner_filter(&self) -> Option<i64> {
        if self.context.role.is_manager_or_higher() {
            None
        } else {
            Some(self.context.usr_id)
        }
    }

    /// The current user's role in the issue's project
    fn reader_role(&self, issue_id: i64) -> Result<Role> {
        let prj_id = self.project_id(issue_id)?.unwrap_or(self.context.prj_id);
        self.role_by_user(self.context.usr_id, prj_id)
    }

    /// Insert an attachment row, returning its ID
    pub fn add_attachment(
        &self,
        issue_id: i64,
        usr_id: i64,
        description: &str,
        internal_only: bool,
        unknown_user: Option<&str>,
        note_id: Option<i64>,
    ) -> Result<i64> {
        queries::insert_attachment(
            self.db(),
            issue_id,
            usr_id,
            description,
            AttachmentStatus::from_internal_only(internal_only),
            unknown_user.filter(|u| !u.is_empty()),
            note_id,
        )
    }

    /// Store one file of an attachment
    pub fn add_attachment_file(&self, iat_id: i64, filename: &str, filetype: &str, blob: &[u8]) -> Result<i64> {
        queries::insert_attachment_file(self.db(), iat_id, filename, filetype, blob)
    }

    /// Attach uploaded files to an issue
    ///
    /// Slots with an empty filename are skipped. An empty or oversized file
    /// fails the whole upload, as does having nothing to store. On success
    /// the issue is marked updated, a history entry is written and
    /// subscribers are notified.
    pub fn attach(
        &self,
        usr_id: i64,
        issue_id: i64,
        description: &str,
        files: &[UploadedFile],
        status: AttachmentStatus,
    ) -> Code {
        let mut accepted = Vec::with_capacity(files.len());
        for file in files {
            if file.filename.is_empty() {
                continue;
            }
            if file.data.is_empty() {
                warn!(issue_id, filename = %file.filename, "empty upload");
                return Code::Failed;
            }
            if self.max_attachment_size > 0 && file.data.len() as u64 > self.max_attachment_size {
                warn!(issue_id, filename = %file.filename, size = file.data.len(), "upload too large");
                return Code::Failed;
            }
            accepted.push(file);
        }
        if accepted.is_empty() {
            return Code::Failed;
        }

        let internal_only = status == AttachmentStatus::Internal;
        let stored = self.transaction(|_| {
            let iat_id = self.add_attachment(issue_id, usr_id, description, internal_only, None, None)?;
            for file in &accepted {
                self.add_attachment_file(iat_id, &file.filename, &file.mime_type, &file.data)?;
            }
            Ok(iat_id)
        });

        let iat_id = match stored {
            Ok(id) => id,
            Err(e) => {
                warn!(issue_id, error = %e, "attachment rolled back");
                return Code::Failed;
            }
        };
        info!(issue_id, iat_id, files = accepted.len(), "attachment uploaded");

        if let Err(e) = self.record_upload(usr_id, issue_id) {
            warn!(issue_id, error = %e, "could not record attachment upload");
        }
        self.notifier.notify(issue_id, NotificationType::Files, iat_id, internal_only);

        Code::Success
    }

    fn record_upload(&self, usr_id: i64, issue_id: i64) -> Result<()> {
        self.mark_as_updated(issue_id)?;
        let name = self.full_name(usr_id)?.unwrap_or_default();
        self.add_history(
            issue_id,
            usr_id,
            HistoryType::AttachmentAdded,
            &format!("Attachment uploaded by {}", name),
        )?;

        if let Some(prj_id) = self.project_id(issue_id)? {
            if self.has_customer_integration(prj_id)? && self.role_by_user(usr_id, prj_id)? == Role::Customer {
                self.record_last_customer_action(issue_id)?;
            }
        }
        Ok(())
    }

    /// Delete an attachment and its files
    ///
    /// Returns `Rejected` when the attachment does not exist or belongs to
    /// someone else and the current user is below Manager.
    pub fn remove_attachment(&self, iat_id: i64, add_history: bool) -> Code {
        let issue_id = match queries::get_attachment_issue_id(self.db(), iat_id, self.owner_filter()) {
            Ok(Some(id)) => id,
            Ok(None) => return Code::Rejected,
            Err(e) => {
                warn!(iat_id, error = %e, "could not look up attachment");
                return Code::Failed;
            }
        };

        let deleted = self.transaction(|db| {
            let files = queries::get_attachment_files(db, iat_id)?;
            queries::delete_attachment(db, iat_id, issue_id)?;
            for file in files {
                queries::delete_attachment_file(db, file.iaf_id)?;
            }
            Ok(())
        });
        if let Err(e) = deleted {
            warn!(iat_id, error = %e, "could not remove attachment");
            return Code::Failed;
        }
        info!(iat_id, issue_id, "attachment removed");

        if add_history {
            if let Err(e) = self.record_removal(issue_id) {
                warn!(issue_id, error = %e, "could not record attachment removal");
            }
        }
        Code::Success
    }

    fn record_removal(&self, issue_id: i64) -> Result<()> {
        let usr_id = self.context.usr_id;
        self.mark_as_updated(issue_id)?;
        let name = self.full_name(usr_id)?.unwrap_or_default();
        self.add_history(
            issue_id,
            usr_id,
            HistoryType::AttachmentRemoved,
            &format!("Attachment removed by {}", name),
        )?;
        Ok(())
    }

    /// Delete one file; the attachment goes with it when it was the last file
    pub fn remove_individual_file(&self, iaf_id: i64) -> Code {
        match queries::get_file_issue_id(self.db(), iaf_id, self.owner_filter()) {
            Ok(Some(_)) => {}
            Ok(None) => return Code::Rejected,
            Err(e) => {
                warn!(iaf_id, error = %e, "could not look up attachment file");
                return Code::Failed;
            }
        }

        let iat_id = match queries::get_file_attachment_id(self.db(), iaf_id) {
            Ok(Some(id)) => id,
            Ok(None) => return Code::Rejected,
            Err(_) => return Code::Failed,
        };

        match self.file_entries(iat_id) {
            Ok(files) if files.len() > 1 => self.remove_file(iaf_id),
            Ok(_) => self.remove_attachment(iat_id, true),
            Err(e) => {
                warn!(iat_id, error = %e, "could not list attachment files");
                Code::Failed
            }
        }
    }

    /// Delete a single file row without permission checks
    pub fn remove_file(&self, iaf_id: i64) -> Code {
        self.code_for(queries::delete_attachment_file(self.db(), iaf_id), "remove attachment file")
    }

    /// Remove every attachment of the given issues
    pub fn remove_attachments_by_issues(&self, issue_ids: &[i64]) -> bool {
        let ids = match queries::get_issue_attachment_ids(self.db(), issue_ids) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "could not list issue attachments");
                return false;
            }
        };
        for iat_id in ids {
            self.remove_attachment(iat_id, true);
        }
        true
    }

    /// Files of an attachment with formatted sizes
    ///
    /// Empty when the attachment is missing, or internal and the reader is
    /// customer-or-lower.
    pub fn attachment_file_list(&self, iat_id: i64) -> Result<Vec<FileListEntry>> {
        let Some(attachment) = queries::get_attachment(self.db(), iat_id)? else {
            return Ok(Vec::new());
        };
        if attachment.status == AttachmentStatus::Internal
            && self.reader_role(attachment.issue_id)?.is_customer_or_lower()
        {
            return Ok(Vec::new());
        }
        self.file_entries(iat_id)
    }

    /// Files of an attachment without visibility checks
    pub(crate) fn file_entries(&self, iat_id: i64) -> Result<Vec<FileListEntry>> {
        Ok(queries::get_attachment_files(self.db(), iat_id)?
            .into_iter()
            .map(|file| FileListEntry {
                iaf_id: file.iaf_id,
                filesize_formatted: format_file_size(file.filesize.max(0) as u64),
                filename: file.filename,
                filesize: file.filesize,
            })
            .collect())
    }

    /// Attachments of an issue visible to the current user, oldest first
    pub fn attachment_list(&self, issue_id: i64) -> Result<Vec<AttachmentListEntry>> {
        let public_only = self.reader_role(issue_id)?.is_customer_or_lower();
        let rows = queries::get_attachment_list(self.db(), issue_id, public_only)?;

        let mut list = Vec::with_capacity(rows.len());
        for row in rows {
            let attachment = row.attachment;
            let usr_full_name = attachment.unknown_user.clone().unwrap_or(row.usr_full_name);
            list.push(AttachmentListEntry {
                files: self.file_entries(attachment.iat_id)?,
                iat_id: attachment.iat_id,
                usr_id: attachment.usr_id,
                usr_full_name,
                created_date: attachment.created_date,
                description: attachment.description,
                unknown_user: attachment.unknown_user,
                status: attachment.status,
            });
        }
        Ok(list)
    }

    /// A file with its attachment; `None` when missing or hidden from the reader
    pub fn attachment_details(&self, iaf_id: i64) -> Result<Option<AttachmentDetails>> {
        let Some(details) = queries::get_attachment_details(self.db(), iaf_id)? else {
            return Ok(None);
        };
        if details.attachment.status == AttachmentStatus::Internal
            && self.reader_role(details.attachment.issue_id)?.is_customer_or_lower()
        {
            return Ok(None);
        }
        Ok(Some(details))
    }

    /// Build the download response for a file the reader may see
    pub fn download(&self, iaf_id: i64, force_inline: bool) -> Result<Option<Download>> {
        Ok(self.attachment_details(iaf_id)?.map(|details| {
            Download::new(
                details.data,
                &details.file.filename,
                details.file.filesize,
                &details.file.filetype,
                force_inline,
            )
        }))
    }

    /// Upload limit formatted for display
    pub fn max_attachment_size(&self) -> String {
        format_file_size(self.max_attachment_size)
    }
}

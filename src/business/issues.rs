//! Issue markers and history

use tracing::debug;
use crate::database::{queries, HistoryEntry, HistoryType, Issue};
use crate::error::Result;
use super::tracker::Tracker;

impl Tracker {
    /// Create an issue in a project
    pub fn add_issue(&self, prj_id: i64, summary: &str) -> Result<i64> {
        queries::insert_issue(self.db(), prj_id, summary)
    }

    /// Get an issue
    pub fn issue(&self, issue_id: i64) -> Result<Option<Issue>> {
        queries::get_issue(self.db(), issue_id)
    }

    /// Project the issue belongs to
    pub fn project_id(&self, issue_id: i64) -> Result<Option<i64>> {
        queries::get_issue_project_id(self.db(), issue_id)
    }

    /// Stamp the issue as updated now
    pub fn mark_as_updated(&self, issue_id: i64) -> Result<()> {
        queries::set_issue_updated(self.db(), issue_id, &queries::now_timestamp())?;
        debug!(issue_id, "issue marked as updated");
        Ok(())
    }

    /// Stamp the issue's last customer action as now
    pub fn record_last_customer_action(&self, issue_id: i64) -> Result<()> {
        queries::set_issue_last_customer_action(self.db(), issue_id, &queries::now_timestamp())?;
        Ok(())
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Append a history entry
    pub fn add_history(&self, issue_id: i64, usr_id: i64, history_type: HistoryType, summary: &str) -> Result<i64> {
        queries::insert_history(self.db(), issue_id, usr_id, history_type, summary)
    }

    /// History of an issue, oldest first
    pub fn history(&self, issue_id: i64) -> Result<Vec<HistoryEntry>> {
        queries::get_history(self.db(), issue_id)
    }
}

//! Issue resolution administration

use crate::database::{queries, Resolution};
use crate::error::Result;
use super::Code;
use super::tracker::Tracker;

impl Tracker {
    /// Add a resolution; a blank title is rejected
    pub fn insert_resolution(&self, title: &str, rank: i64) -> Code {
        let title = title.trim();
        if title.is_empty() {
            return Code::Rejected;
        }
        self.code_for(queries::insert_resolution(self.db(), title, rank), "add resolution")
    }

    /// Rename or re-rank a resolution; a blank title is rejected
    pub fn update_resolution(&self, res_id: i64, title: &str, rank: i64) -> Code {
        let title = title.trim();
        if title.is_empty() {
            return Code::Rejected;
        }
        self.code_for(queries::update_resolution(self.db(), res_id, title, rank), "update resolution")
    }

    /// Delete resolutions and clear them from the issues using them
    pub fn remove_resolutions(&self, res_ids: &[i64]) -> Code {
        let result = self.transaction(|db| {
            queries::clear_issue_resolutions(db, res_ids)?;
            queries::delete_resolutions(db, res_ids)
        });
        self.code_for(result, "remove resolutions")
    }

    /// Get a resolution
    pub fn resolution(&self, res_id: i64) -> Result<Option<Resolution>> {
        queries::get_resolution(self.db(), res_id)
    }

    /// All resolutions ordered by rank, then title
    pub fn resolutions(&self) -> Result<Vec<Resolution>> {
        queries::get_resolutions(self.db())
    }

    /// Resolution ID to title for selection lists
    pub fn resolution_titles(&self) -> Result<Vec<(i64, String)>> {
        queries::get_resolution_titles(self.db())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::tracker::tests::create_test_tracker;

    #[test]
    fn test_blank_title_is_rejected() {
        let (tracker, _fixture) = create_test_tracker();
        assert_eq!(tracker.insert_resolution("   ", 1), Code::Rejected);
        assert_eq!(tracker.update_resolution(1, "", 1), Code::Rejected);
        assert!(tracker.resolutions().unwrap().is_empty());
    }

    #[test]
    fn test_insert_and_update() {
        let (tracker, _fixture) = create_test_tracker();
        assert_eq!(tracker.insert_resolution("fixed", 2), Code::Success);
        assert_eq!(tracker.insert_resolution("duplicate", 1), Code::Success);
        assert_eq!(tracker.insert_resolution("fixed", 3), Code::Failed);

        let list = tracker.resolutions().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].title, "duplicate");

        let fixed = list[1].res_id;
        assert_eq!(tracker.update_resolution(fixed, " resolved ", 0), Code::Success);
        let updated = tracker.resolution(fixed).unwrap().unwrap();
        assert_eq!(updated.title, "resolved");
        assert_eq!(updated.rank, 0);
    }

    #[test]
    fn test_remove_clears_issues() {
        let (tracker, fixture) = create_test_tracker();
        tracker.insert_resolution("fixed", 1);
        let res_id = tracker.resolution_titles().unwrap()[0].0;
        queries::set_issue_resolution(tracker.db(), fixture.iss_id, Some(res_id)).unwrap();

        assert_eq!(tracker.remove_resolutions(&[res_id]), Code::Success);
        assert!(tracker.resolution(res_id).unwrap().is_none());
        assert_eq!(tracker.issue(fixture.iss_id).unwrap().unwrap().res_id, None);
    }
}

//! Custom field administration

use tracing::debug;
use crate::database::{queries, CustomField, CustomFieldInput};
use crate::error::Result;
use super::Code;
use super::tracker::Tracker;

/// Direction to move a field in the display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDirection {
    /// Towards the top (lower rank)
    Up,
    /// Towards the bottom (higher rank)
    Down,
}

impl RankDirection {
    /// Parse `-1`/`up` or `1`/`down`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "-1" | "up" => Some(RankDirection::Up),
            "1" | "+1" | "down" => Some(RankDirection::Down),
            _ => None,
        }
    }
}

impl Tracker {
    /// Add a custom field at the bottom of the order
    pub fn insert_custom_field(&self, input: &CustomFieldInput) -> Code {
        if input.title.trim().is_empty() {
            return Code::Rejected;
        }
        let result = self.transaction(|db| {
            let rank = queries::max_custom_field_rank(db)? + 1;
            let fld_id = queries::insert_custom_field(db, input, rank)?;
            queries::add_custom_field_projects(db, fld_id, &input.projects)?;
            Ok(fld_id)
        });
        self.code_for(result, "add custom field")
    }

    /// Replace a custom field's definition and project links
    pub fn update_custom_field(&self, fld_id: i64, input: &CustomFieldInput) -> Code {
        if input.title.trim().is_empty() {
            return Code::Rejected;
        }
        let result = self.transaction(|db| {
            queries::update_custom_field(db, fld_id, input)?;
            queries::delete_custom_field_projects(db, &[fld_id])?;
            queries::add_custom_field_projects(db, fld_id, &input.projects)
        });
        self.code_for(result, "update custom field")
    }

    /// Delete custom fields with their project links
    pub fn remove_custom_fields(&self, fld_ids: &[i64]) -> Code {
        let result = self.transaction(|db| {
            queries::delete_custom_field_projects(db, fld_ids)?;
            queries::delete_custom_fields(db, fld_ids)
        });
        self.code_for(result, "remove custom fields")
    }

    /// Swap a field's rank with its neighbour in `direction`
    ///
    /// Moving the first field up or the last one down changes nothing.
    pub fn change_custom_field_rank(&self, fld_id: i64, direction: RankDirection) -> Code {
        let fields = match self.custom_fields() {
            Ok(fields) => fields,
            Err(e) => return self.code_for(Err::<(), _>(e), "change custom field rank"),
        };
        let Some(pos) = fields.iter().position(|f| f.fld_id == fld_id) else {
            return Code::Rejected;
        };
        let neighbour = match direction {
            RankDirection::Up => pos.checked_sub(1).and_then(|p| fields.get(p)),
            RankDirection::Down => fields.get(pos + 1),
        };
        let Some(neighbour) = neighbour else {
            return Code::Success;
        };

        let field = &fields[pos];
        // equal ranks would not move, so fall back to list positions
        let (field_rank, neighbour_rank) = if field.rank == neighbour.rank {
            let other = match direction {
                RankDirection::Up => pos - 1,
                RankDirection::Down => pos + 1,
            };
            (other as i64 + 1, pos as i64 + 1)
        } else {
            (neighbour.rank, field.rank)
        };

        let result = self.transaction(|db| {
            queries::set_custom_field_rank(db, field.fld_id, field_rank)?;
            queries::set_custom_field_rank(db, neighbour.fld_id, neighbour_rank)
        });
        debug!(fld_id, ?direction, "custom field rank changed");
        self.code_for(result, "change custom field rank")
    }

    /// A custom field with its project IDs
    pub fn custom_field(&self, fld_id: i64) -> Result<Option<CustomField>> {
        queries::get_custom_field(self.db(), fld_id)
    }

    /// All custom fields in display order
    pub fn custom_fields(&self) -> Result<Vec<CustomField>> {
        queries::get_custom_fields(self.db())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::tracker::tests::create_test_tracker;
    use crate::database::{CustomFieldType, Role};

    fn field(title: &str, projects: Vec<i64>) -> CustomFieldInput {
        CustomFieldInput {
            title: title.to_string(),
            description: format!("{} description", title),
            field_type: CustomFieldType::Text,
            min_role: Some(Role::User),
            projects,
        }
    }

    fn titles(tracker: &Tracker) -> Vec<String> {
        tracker.custom_fields().unwrap().into_iter().map(|f| f.title).collect()
    }

    #[test]
    fn test_insert_appends_rank() {
        let (tracker, fixture) = create_test_tracker();
        assert_eq!(tracker.insert_custom_field(&field("Browser", vec![fixture.prj_id])), Code::Success);
        assert_eq!(tracker.insert_custom_field(&field("OS", vec![])), Code::Success);
        assert_eq!(tracker.insert_custom_field(&field(" ", vec![])), Code::Rejected);

        let fields = tracker.custom_fields().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].rank, 1);
        assert_eq!(fields[1].rank, 2);
        assert_eq!(fields[0].projects, vec![fixture.prj_id]);
        assert_eq!(fields[0].min_role, Some(Role::User));
    }

    #[test]
    fn test_update_replaces_projects() {
        let (tracker, fixture) = create_test_tracker();
        tracker.insert_custom_field(&field("Browser", vec![fixture.prj_id]));
        let fld_id = tracker.custom_fields().unwrap()[0].fld_id;
        let other = tracker.add_project("Other", None).unwrap();

        let mut input = field("Web browser", vec![other]);
        input.field_type = CustomFieldType::Combo;
        assert_eq!(tracker.update_custom_field(fld_id, &input), Code::Success);

        let updated = tracker.custom_field(fld_id).unwrap().unwrap();
        assert_eq!(updated.title, "Web browser");
        assert_eq!(updated.field_type, CustomFieldType::Combo);
        assert_eq!(updated.projects, vec![other]);
    }

    #[test]
    fn test_change_rank() {
        let (tracker, _fixture) = create_test_tracker();
        for title in ["A", "B", "C"] {
            tracker.insert_custom_field(&field(title, vec![]));
        }
        let c = tracker.custom_fields().unwrap()[2].fld_id;

        assert_eq!(tracker.change_custom_field_rank(c, RankDirection::Up), Code::Success);
        assert_eq!(titles(&tracker), vec!["A", "C", "B"]);

        let a = tracker.custom_fields().unwrap()[0].fld_id;
        assert_eq!(tracker.change_custom_field_rank(a, RankDirection::Up), Code::Success);
        assert_eq!(titles(&tracker), vec!["A", "C", "B"]);

        assert_eq!(tracker.change_custom_field_rank(a, RankDirection::Down), Code::Success);
        assert_eq!(titles(&tracker), vec!["C", "A", "B"]);

        assert_eq!(tracker.change_custom_field_rank(999, RankDirection::Down), Code::Rejected);
    }

    #[test]
    fn test_remove_deletes_links() {
        let (tracker, fixture) = create_test_tracker();
        tracker.insert_custom_field(&field("Browser", vec![fixture.prj_id]));
        let fld_id = tracker.custom_fields().unwrap()[0].fld_id;

        assert_eq!(tracker.remove_custom_fields(&[fld_id]), Code::Success);
        assert!(tracker.custom_field(fld_id).unwrap().is_none());
        assert!(queries::get_custom_field_projects(tracker.db(), fld_id).unwrap().is_empty());
    }

    #[test]
    fn test_rank_direction_parse() {
        assert_eq!(RankDirection::parse("-1"), Some(RankDirection::Up));
        assert_eq!(RankDirection::parse("DOWN"), Some(RankDirection::Down));
        assert_eq!(RankDirection::parse("sideways"), None);
    }
}

//! Custom field admin page

use crate::business::users::role_titles;
use crate::business::{Code, RankDirection, Tracker};
use crate::database::{CustomFieldInput, CustomFieldType, Role, NEVER_DISPLAY_ROLE};
use crate::error::Result;
use super::{Action, Controller, MessageKind, MessageMap, Page, Request};

/// Handles `manage/custom_fields.tpl.html`
#[derive(Debug, Default)]
pub struct CustomFieldsController {
    action: Option<Action>,
}

impl CustomFieldsController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field definition from the form; unknown types fall back to text
    fn field_input(request: &Request) -> CustomFieldInput {
        CustomFieldInput {
            title: request.get("title").unwrap_or_default().to_string(),
            description: request.get("description").unwrap_or_default().to_string(),
            field_type: request
                .get("field_type")
                .and_then(CustomFieldType::parse)
                .unwrap_or_default(),
            min_role: request.get_int("min_role").and_then(Role::from_id),
            projects: request.get_ids("projects"),
        }
    }

    /// Roles offered for the minimum role select
    ///
    /// Customer is offered only when the current project has customer
    /// integration.
    fn user_roles(tracker: &Tracker) -> Result<Vec<(i64, &'static str)>> {
        let excluded = if tracker.has_customer_integration(tracker.context().prj_id)? {
            Vec::new()
        } else {
            vec![Role::Customer]
        };
        let mut roles = role_titles(&excluded);
        roles.push((NEVER_DISPLAY_ROLE, "Never Display"));
        Ok(roles)
    }
}

impl Controller for CustomFieldsController {
    fn template(&self) -> &'static str {
        "manage/custom_fields.tpl.html"
    }

    fn min_role(&self) -> Role {
        Role::Administrator
    }

    fn configure(&mut self, request: &Request) {
        self.action = request.action();
    }

    fn default_action(&mut self, tracker: &Tracker, request: &Request, page: &mut Page) -> Result<()> {
        match self.action {
            Some(Action::New) => {
                let code = tracker.insert_custom_field(&Self::field_input(request));
                page.assign("result", &code.as_i32())?;
                page.map_messages(code, &MessageMap::new(&[
                    (Code::Success, "Thank you, the custom field was added successfully.", MessageKind::Info),
                    (Code::Failed, "An error occurred while trying to add the new custom field.", MessageKind::Error),
                    (Code::Rejected, "Please enter the title for this new custom field.", MessageKind::Error),
                ]));
            }
            Some(Action::Update) => {
                let fld_id = request.get_int("id").unwrap_or_default();
                let code = tracker.update_custom_field(fld_id, &Self::field_input(request));
                page.assign("result", &code.as_i32())?;
                page.map_messages(code, &MessageMap::new(&[
                    (Code::Success, "Thank you, the custom field was updated successfully.", MessageKind::Info),
                    (Code::Failed, "An error occurred while trying to update the custom field information.", MessageKind::Error),
                    (Code::Rejected, "Please enter the title for this custom field.", MessageKind::Error),
                ]));
            }
            Some(Action::Delete) => {
                let code = tracker.remove_custom_fields(&request.get_ids("items"));
                page.assign("result", &code.as_i32())?;
            }
            Some(Action::ChangeRank) => {
                let fld_id = request.get_int("id").unwrap_or_default();
                if let Some(direction) = request.get("direction").and_then(RankDirection::parse) {
                    tracker.change_custom_field_rank(fld_id, direction);
                }
            }
            Some(Action::Edit) => {
                let info = tracker.custom_field(request.get_int("id").unwrap_or_default())?;
                page.assign("info", &info)?;
            }
            None => {}
        }
        Ok(())
    }

    fn prepare_template(&mut self, tracker: &Tracker, page: &mut Page) -> Result<()> {
        page.assign("show_setup_links", &true)?;
        page.assign("list", &tracker.custom_fields()?)?;
        page.assign("project_list", &tracker.projects()?)?;
        page.assign("user_roles", &Self::user_roles(tracker)?)
    }
}

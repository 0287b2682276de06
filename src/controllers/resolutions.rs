//! Issue resolution admin page

use crate::business::{Code, Tracker};
use crate::database::Role;
use crate::error::Result;
use super::{Action, Controller, MessageKind, MessageMap, Page, Request};

const TITLE_REQUIRED: &str = "Please enter the title for this new issue resolution.";

/// Handles `manage/resolution.tpl.html`
#[derive(Debug, Default)]
pub struct ResolutionController {
    action: Option<Action>,
}

impl ResolutionController {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_action(&self, tracker: &Tracker, request: &Request, page: &mut Page) {
        let code = tracker.insert_resolution(
            request.get("title").unwrap_or_default(),
            request.get_int("rank").unwrap_or_default(),
        );
        page.map_messages(code, &MessageMap::new(&[
            (Code::Success, "Thank you, the issue resolution was added successfully.", MessageKind::Info),
            (Code::Failed, "An error occurred while trying to add the new issue resolution.", MessageKind::Info),
            (Code::Rejected, TITLE_REQUIRED, MessageKind::Error),
        ]));
    }

    fn update_action(&self, tracker: &Tracker, request: &Request, page: &mut Page) {
        let code = tracker.update_resolution(
            request.get_int("id").unwrap_or_default(),
            request.get("title").unwrap_or_default(),
            request.get_int("rank").unwrap_or_default(),
        );
        page.map_messages(code, &MessageMap::new(&[
            (Code::Success, "Thank you, the issue resolution was updated successfully.", MessageKind::Info),
            (Code::Failed, "An error occurred while trying to update the new issue resolution.", MessageKind::Info),
            (Code::Rejected, TITLE_REQUIRED, MessageKind::Error),
        ]));
    }
}

impl Controller for ResolutionController {
    fn template(&self) -> &'static str {
        "manage/resolution.tpl.html"
    }

    fn min_role(&self) -> Role {
        Role::Manager
    }

    fn configure(&mut self, request: &Request) {
        self.action = request.action();
    }

    fn default_action(&mut self, tracker: &Tracker, request: &Request, page: &mut Page) -> Result<()> {
        match self.action {
            Some(Action::New) => self.new_action(tracker, request, page),
            Some(Action::Update) => self.update_action(tracker, request, page),
            Some(Action::Delete) => {
                tracker.remove_resolutions(&request.get_ids("items"));
            }
            Some(Action::Edit) => {
                let info = tracker.resolution(request.get_int("id").unwrap_or_default())?;
                page.assign("info", &info)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn prepare_template(&mut self, tracker: &Tracker, page: &mut Page) -> Result<()> {
        page.assign("list", &tracker.resolutions()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::tracker::tests::{as_user, create_test_tracker};
    use crate::controllers::dispatch;

    #[test]
    fn test_new_then_list() {
        let (tracker, _fixture) = create_test_tracker();
        let request = Request::new()
            .with_post("cat", "new")
            .with_post("title", "fixed")
            .with_post("rank", "2");

        let page = dispatch(&mut ResolutionController::new(), &tracker, &request).unwrap();
        assert_eq!(page.template, "manage/resolution.tpl.html");
        assert_eq!(page.messages[0].text, "Thank you, the issue resolution was added successfully.");
        assert_eq!(page.context.get("list").unwrap()[0]["title"], "fixed");
    }

    #[test]
    fn test_blank_title_message() {
        let (tracker, _fixture) = create_test_tracker();
        let request = Request::new().with_post("cat", "new").with_post("title", "  ");

        let page = dispatch(&mut ResolutionController::new(), &tracker, &request).unwrap();
        assert_eq!(page.messages[0].text, TITLE_REQUIRED);
        assert_eq!(page.messages[0].kind, MessageKind::Error);
    }

    #[test]
    fn test_edit_and_delete() {
        let (tracker, _fixture) = create_test_tracker();
        tracker.insert_resolution("duplicate", 1);
        let res_id = tracker.resolutions().unwrap()[0].res_id;

        let edit = Request::new().with_query("cat", "edit").with_query("id", &res_id.to_string());
        let page = dispatch(&mut ResolutionController::new(), &tracker, &edit).unwrap();
        assert_eq!(page.context.get("info").unwrap()["title"], "duplicate");

        let delete = Request::new().with_post("cat", "delete").with_post("items", &res_id.to_string());
        let page = dispatch(&mut ResolutionController::new(), &tracker, &delete).unwrap();
        assert!(page.messages.is_empty());
        assert_eq!(page.context.get("list").unwrap().as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_requires_manager() {
        let (tracker, fixture) = create_test_tracker();
        let developer = as_user(&tracker, fixture.developer_id, Role::Developer);
        let request = Request::new().with_post("cat", "new").with_post("title", "fixed");

        let page = dispatch(&mut ResolutionController::new(), &developer, &request).unwrap();
        assert_eq!(page.context.get("show_not_allowed_msg"), Some(&serde_json::Value::Bool(true)));
        assert!(!page.context.contains("list"));
        assert!(tracker.resolutions().unwrap().is_empty());
    }
}

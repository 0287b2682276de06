//! Customer notes admin page

use serde_json::json;
use crate::business::{Code, Tracker};
use crate::database::Role;
use crate::error::Result;
use super::{Action, Controller, MessageKind, MessageMap, Page, Request};

/// Handles `manage/customer_notes.tpl.html`
#[derive(Debug, Default)]
pub struct CustomerNotesController {
    action: Option<Action>,
    prj_id: Option<i64>,
}

impl CustomerNotesController {
    pub fn new() -> Self {
        Self::default()
    }

    fn note_fields<'a>(request: &'a Request) -> (i64, &'a str, &'a str) {
        (
            request.get_int("project").unwrap_or_default(),
            request.get("customer").unwrap_or_default(),
            request.get("note").unwrap_or_default(),
        )
    }

    fn edit_action(&self, tracker: &Tracker, request: &Request, page: &mut Page) -> Result<()> {
        let Some(note) = tracker.note_details(request.get_int("id").unwrap_or_default())? else {
            return page.assign("info", &serde_json::Value::Null);
        };
        let mut info = serde_json::to_value(&note)?;
        if let Some(prj_id) = self.prj_id {
            info["prj_id"] = json!(prj_id);
        }
        page.assign("info", &info)
    }
}

impl Controller for CustomerNotesController {
    fn template(&self) -> &'static str {
        "manage/customer_notes.tpl.html"
    }

    fn min_role(&self) -> Role {
        Role::Manager
    }

    fn configure(&mut self, request: &Request) {
        self.action = request.action();
        self.prj_id = request.get_int("prj_id").filter(|id| *id > 0);
    }

    fn default_action(&mut self, tracker: &Tracker, request: &Request, page: &mut Page) -> Result<()> {
        match self.action {
            Some(Action::New) => {
                let (prj_id, customer, note) = Self::note_fields(request);
                page.map_messages(tracker.insert_note(prj_id, customer, note), &MessageMap::new(&[
                    (Code::Success, "Thank you, the note was added successfully.", MessageKind::Info),
                    (Code::Failed, "An error occurred while trying to add the new note.", MessageKind::Error),
                ]));
            }
            Some(Action::Update) => {
                let (prj_id, customer, note) = Self::note_fields(request);
                let cno_id = request.get_int("id").unwrap_or_default();
                page.map_messages(tracker.update_note(cno_id, prj_id, customer, note), &MessageMap::new(&[
                    (Code::Success, "Thank you, the note was updated successfully.", MessageKind::Info),
                    (Code::Failed, "An error occurred while trying to update the note.", MessageKind::Error),
                ]));
            }
            Some(Action::Delete) => {
                page.map_messages(tracker.remove_notes(&request.get_ids("items")), &MessageMap::new(&[
                    (Code::Success, "Thank you, the note was deleted successfully.", MessageKind::Info),
                    (Code::Failed, "An error occurred while trying to delete the note.", MessageKind::Error),
                ]));
            }
            Some(Action::Edit) => self.edit_action(tracker, request, page)?,
            _ => {
                if let Some(prj_id) = self.prj_id {
                    page.assign("info", &json!({ "prj_id": prj_id }))?;
                }
            }
        }
        Ok(())
    }

    fn prepare_template(&mut self, tracker: &Tracker, page: &mut Page) -> Result<()> {
        page.assign("list", &tracker.note_list()?)?;
        page.assign("project_list", &tracker.projects()?)
    }
}

//! Attachment upload and removal page

use crate::business::{Code, Tracker};
use crate::database::{AttachmentStatus, Role};
use crate::error::Result;
use super::{Action, Controller, MessageKind, MessageMap, Page, Request};

/// Handles `file_upload.tpl.html`
///
/// `cat=new` uploads the request files to `issue_id`. `cat=delete` removes
/// the file named by `iaf_id`, or the whole attachment named by `id`.
#[derive(Debug, Default)]
pub struct AttachmentController {
    action: Option<Action>,
    issue_id: Option<i64>,
}

impl AttachmentController {
    pub fn new() -> Self {
        Self::default()
    }

    fn upload_action(&self, tracker: &Tracker, request: &Request, page: &mut Page) {
        let Some(issue_id) = self.issue_id else {
            page.map_messages(Code::Failed, &upload_messages());
            return;
        };
        let status = request
            .get("status")
            .and_then(|s| s.parse::<AttachmentStatus>().ok())
            .unwrap_or_default();
        let code = tracker.attach(
            tracker.context().usr_id,
            issue_id,
            request.get("file_description").unwrap_or_default(),
            request.files(),
            status,
        );
        page.map_messages(code, &upload_messages());
    }

    fn delete_action(&self, tracker: &Tracker, request: &Request, page: &mut Page) {
        let code = match request.get_int("iaf_id") {
            Some(iaf_id) => tracker.remove_individual_file(iaf_id),
            None => tracker.remove_attachment(request.get_int("id").unwrap_or_default(), true),
        };
        page.map_messages(code, &MessageMap::new(&[
            (Code::Success, "Thank you, the attachment was removed successfully.", MessageKind::Info),
            (Code::Failed, "An error occurred while trying to remove the attachment.", MessageKind::Error),
            (Code::Rejected, "You do not have the permission to remove this attachment.", MessageKind::Error),
        ]));
    }
}

fn upload_messages() -> MessageMap {
    MessageMap::new(&[
        (Code::Success, "Thank you, the uploaded file was associated with the issue below.", MessageKind::Info),
        (Code::Failed, "An error occurred while trying to process the uploaded file.", MessageKind::Error),
    ])
}

impl Controller for AttachmentController {
    fn template(&self) -> &'static str {
        "file_upload.tpl.html"
    }

    fn min_role(&self) -> Role {
        Role::Reporter
    }

    fn configure(&mut self, request: &Request) {
        self.action = request.action();
        self.issue_id = request.get_int("issue_id").filter(|id| *id > 0);
    }

    fn default_action(&mut self, tracker: &Tracker, request: &Request, page: &mut Page) -> Result<()> {
        match self.action {
            Some(Action::New) => self.upload_action(tracker, request, page),
            Some(Action::Delete) => self.delete_action(tracker, request, page),
            _ => {}
        }
        Ok(())
    }

    fn prepare_template(&mut self, tracker: &Tracker, page: &mut Page) -> Result<()> {
        page.assign("max_attachment_size", &tracker.max_attachment_size())?;
        if let Some(issue_id) = self.issue_id {
            page.assign("issue_id", &issue_id)?;
            page.assign("attachments", &tracker.attachment_list(issue_id)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::tracker::tests::{as_user, create_test_tracker};
    use crate::controllers::dispatch;
    use crate::database::UploadedFile;

    fn upload(issue_id: i64, status: &str) -> Request {
        Request::new()
            .with_post("cat", "new")
            .with_post("issue_id", &issue_id.to_string())
            .with_post("file_description", "logs")
            .with_post("status", status)
            .with_file(UploadedFile::new("trace.log", "text/plain", b"stack trace"))
    }

    #[test]
    fn test_upload_lists_attachment() {
        let (tracker, fixture) = create_test_tracker();
        let page = dispatch(&mut AttachmentController::new(), &tracker, &upload(fixture.iss_id, "internal")).unwrap();

        assert_eq!(page.messages[0].kind, MessageKind::Info);
        let attachments = page.context.get("attachments").unwrap();
        assert_eq!(attachments[0]["description"], "logs");
        assert_eq!(attachments[0]["status"], "internal");
        assert_eq!(attachments[0]["files"][0]["filename"], "trace.log");
        assert_eq!(page.context.get("max_attachment_size").unwrap(), "2.00 MB");
    }

    #[test]
    fn test_upload_without_files_fails() {
        let (tracker, fixture) = create_test_tracker();
        let request = Request::new()
            .with_post("cat", "new")
            .with_post("issue_id", &fixture.iss_id.to_string());

        let page = dispatch(&mut AttachmentController::new(), &tracker, &request).unwrap();
        assert_eq!(page.messages[0].text, "An error occurred while trying to process the uploaded file.");
        assert_eq!(page.context.get("attachments").unwrap().as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_customer_cannot_remove_others_upload() {
        let (tracker, fixture) = create_test_tracker();
        dispatch(&mut AttachmentController::new(), &tracker, &upload(fixture.iss_id, "public")).unwrap();
        let iat_id = tracker.attachment_list(fixture.iss_id).unwrap()[0].iat_id;

        let customer = as_user(&tracker, fixture.customer_id, Role::Customer);
        let request = Request::new().with_post("cat", "delete").with_post("id", &iat_id.to_string());
        let page = dispatch(&mut AttachmentController::new(), &customer, &request).unwrap();
        assert_eq!(page.messages[0].text, "You do not have the permission to remove this attachment.");

        let page = dispatch(&mut AttachmentController::new(), &tracker, &request).unwrap();
        assert_eq!(page.messages[0].text, "Thank you, the attachment was removed successfully.");
        assert!(tracker.attachment_list(fixture.iss_id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_single_file() {
        let (tracker, fixture) = create_test_tracker();
        dispatch(&mut AttachmentController::new(), &tracker, &upload(fixture.iss_id, "public")).unwrap();
        let iaf_id = tracker.attachment_list(fixture.iss_id).unwrap()[0].files[0].iaf_id;

        let request = Request::new()
            .with_post("cat", "delete")
            .with_post("iaf_id", &iaf_id.to_string())
            .with_query("issue_id", &fixture.iss_id.to_string());
        let page = dispatch(&mut AttachmentController::new(), &tracker, &request).unwrap();
        assert_eq!(page.messages[0].kind, MessageKind::Info);
        assert_eq!(page.context.get("attachments").unwrap().as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_viewer_not_allowed() {
        let (tracker, fixture) = create_test_tracker();
        let viewer = as_user(&tracker, fixture.customer_id, Role::Viewer);
        let page = dispatch(&mut AttachmentController::new(), &viewer, &upload(fixture.iss_id, "public")).unwrap();
        assert!(page.context.contains("show_not_allowed_msg"));
        assert!(tracker.attachment_list(fixture.iss_id).unwrap().is_empty());
    }
}

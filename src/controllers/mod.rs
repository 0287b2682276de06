//! Request handlers for the admin and attachment pages
//!
//! A controller reads [`Request`] parameters, calls into the [`Tracker`]
//! and fills a [`Page`]: the template name, the values assigned to it and
//! the status messages to show. Rendering is left to the caller.

pub mod attachments;
pub mod custom_fields;
pub mod customer_notes;
pub mod resolutions;

use std::collections::HashMap;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};
use crate::business::{Code, RequestContext, Tracker};
use crate::config::Setup;
use crate::database::{Connector, Role, UploadedFile};
use crate::error::Result;

pub use attachments::AttachmentController;
pub use custom_fields::CustomFieldsController;
pub use customer_notes::CustomerNotesController;
pub use resolutions::ResolutionController;

/// Template shown when the database is unreachable
pub const OFFLINE_TEMPLATE: &str = "offline.tpl.html";

/// Request parameters and uploads
///
/// Lookups check the form body first, then the query string.
#[derive(Debug, Clone, Default)]
pub struct Request {
    post: HashMap<String, Vec<String>>,
    query: HashMap<String, Vec<String>>,
    files: Vec<UploadedFile>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a form body value; repeat the name for list parameters
    pub fn with_post(mut self, name: &str, value: &str) -> Self {
        self.post.entry(name.to_string()).or_default().push(value.to_string());
        self
    }

    /// Add a query string value
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.entry(name.to_string()).or_default().push(value.to_string());
        self
    }

    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    fn values(&self, name: &str) -> Option<&Vec<String>> {
        self.post
            .get(name)
            .filter(|v| !v.is_empty())
            .or_else(|| self.query.get(name))
    }

    /// First value of a parameter
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values(name)?.first().map(String::as_str)
    }

    /// Parameter as an integer; missing or malformed values are `None`
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name)?.trim().parse().ok()
    }

    /// Every value of a list parameter as IDs, skipping malformed ones
    pub fn get_ids(&self, name: &str) -> Vec<i64> {
        self.values(name)
            .map(|values| values.iter().filter_map(|v| v.trim().parse().ok()).collect())
            .unwrap_or_default()
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Action selected by the `cat` parameter
    pub fn action(&self) -> Option<Action> {
        self.get("cat").and_then(Action::parse)
    }
}

/// Page action selected by the `cat` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    New,
    Update,
    Delete,
    Edit,
    ChangeRank,
}

impl Action {
    pub fn parse(cat: &str) -> Option<Action> {
        match cat {
            "new" => Some(Action::New),
            "update" => Some(Action::Update),
            "delete" => Some(Action::Delete),
            "edit" => Some(Action::Edit),
            "change_rank" => Some(Action::ChangeRank),
            _ => None,
        }
    }
}

/// How a status message is styled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Info,
    Error,
}

/// Status message shown above the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub text: String,
    pub kind: MessageKind,
}

/// Messages keyed by result code
#[derive(Debug, Clone, Default)]
pub struct MessageMap {
    entries: Vec<(Code, &'static str, MessageKind)>,
}

impl MessageMap {
    pub fn new(entries: &[(Code, &'static str, MessageKind)]) -> Self {
        Self { entries: entries.to_vec() }
    }

    /// Message for `code`, if one is mapped
    pub fn message_for(&self, code: Code) -> Option<Message> {
        self.entries
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, text, kind)| Message { text: text.to_string(), kind: *kind })
    }
}

/// Values assigned to a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    values: Map<String, JsonValue>,
}

impl TemplateContext {
    /// Assign a serializable value under `name`
    pub fn assign<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        self.values.insert(name.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn into_json(self) -> JsonValue {
        JsonValue::Object(self.values)
    }
}

/// Result of handling a request
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub template: String,
    pub context: TemplateContext,
    pub messages: Vec<Message>,
}

impl Page {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
            context: TemplateContext::default(),
            messages: Vec::new(),
        }
    }

    /// Static page for an unreachable database
    pub fn offline() -> Self {
        let mut page = Self::new(OFFLINE_TEMPLATE);
        page.context.values.insert("error_type".to_string(), JsonValue::from("db"));
        page
    }

    pub fn assign<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        self.context.assign(name, value)
    }

    /// Queue the message mapped to `code`; unmapped codes add nothing
    pub fn map_messages(&mut self, code: Code, map: &MessageMap) {
        if let Some(message) = map.message_for(code) {
            self.messages.push(message);
        }
    }
}

/// A page handler
pub trait Controller {
    /// Template the page renders
    fn template(&self) -> &'static str;

    /// Lowest role allowed on the page
    fn min_role(&self) -> Role;

    /// Read request parameters before any action runs
    fn configure(&mut self, _request: &Request) {}

    /// Run the action the request selected
    fn default_action(&mut self, tracker: &Tracker, request: &Request, page: &mut Page) -> Result<()>;

    /// Assign the values every rendering needs
    fn prepare_template(&mut self, tracker: &Tracker, page: &mut Page) -> Result<()>;
}

/// Run a controller against a tracker
///
/// Users below the controller's minimum role get the page with only
/// `show_not_allowed_msg` set.
pub fn dispatch<C: Controller + ?Sized>(controller: &mut C, tracker: &Tracker, request: &Request) -> Result<Page> {
    let mut page = Page::new(controller.template());
    let context = tracker.context();

    if context.role < controller.min_role() {
        warn!(usr_id = context.usr_id, template = controller.template(), "page not allowed");
        page.assign("show_not_allowed_msg", &true)?;
        return Ok(page);
    }

    controller.configure(request);
    controller.default_action(tracker, request, &mut page)?;
    controller.prepare_template(tracker, &mut page)?;
    debug!(template = controller.template(), messages = page.messages.len(), "page prepared");
    Ok(page)
}

/// Connect and run a controller, serving the offline page when the
/// database is unreachable
pub fn serve<C: Controller + ?Sized>(
    controller: &mut C,
    connector: &Connector,
    setup: &Setup,
    context: RequestContext,
    request: &Request,
) -> Result<Page> {
    let db = connector.get_instance(true)?;
    if connector.is_offline() {
        return Ok(Page::offline());
    }

    let tracker = Tracker::new(db, context).with_max_attachment_size(setup.attachments.max_size);
    dispatch(controller, &tracker, request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_wins_over_query() {
        let request = Request::new()
            .with_query("cat", "edit")
            .with_post("cat", "update")
            .with_query("id", "12");
        assert_eq!(request.action(), Some(Action::Update));
        assert_eq!(request.get_int("id"), Some(12));
        assert_eq!(request.get("missing"), None);
    }

    #[test]
    fn test_get_ids() {
        let request = Request::new()
            .with_post("items", "3")
            .with_post("items", "x")
            .with_post("items", " 5 ");
        assert_eq!(request.get_ids("items"), vec![3, 5]);
        assert!(request.get_ids("none").is_empty());
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(Action::parse("change_rank"), Some(Action::ChangeRank));
        assert_eq!(Action::parse("drop"), None);
    }

    #[test]
    fn test_message_map() {
        let map = MessageMap::new(&[
            (Code::Success, "Saved.", MessageKind::Info),
            (Code::Failed, "Failed.", MessageKind::Error),
        ]);
        let mut page = Page::new("x.tpl.html");
        page.map_messages(Code::Rejected, &map);
        assert!(page.messages.is_empty());
        page.map_messages(Code::Failed, &map);
        assert_eq!(page.messages, vec![Message { text: "Failed.".into(), kind: MessageKind::Error }]);
    }

    #[test]
    fn test_offline_page() {
        let page = Page::offline();
        assert_eq!(page.template, OFFLINE_TEMPLATE);
        assert_eq!(page.context.get("error_type"), Some(&JsonValue::from("db")));
    }

    #[test]
    fn test_template_context() {
        let mut context = TemplateContext::default();
        context.assign("list", &vec![1, 2]).unwrap();
        assert!(context.contains("list"));
        assert_eq!(context.into_json()["list"], serde_json::json!([1, 2]));
    }
}

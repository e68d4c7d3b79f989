//! Webforms, their summary handlers and submissions

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::config::validation;

/// Plugin id of the summary mail handler
pub const SUMMARY_HANDLER_PLUGIN_ID: &str = "mail_summary_handler";

/// Machine name of a webform
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebformId(String);

impl WebformId {
    /// Create a webform id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WebformId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for WebformId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for WebformId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A webform definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webform {
    /// Machine name
    pub id: WebformId,

    /// Human readable title
    #[serde(default)]
    pub title: String,

    /// Element keys in form order; these become the data columns of an export
    #[serde(default)]
    pub elements: Vec<String>,

    /// Attached handler instances
    #[serde(default)]
    pub handlers: Vec<WebformHandler>,
}

impl Webform {
    /// Create a webform with no elements and no handlers
    #[must_use]
    pub fn new(id: impl Into<WebformId>) -> Self {
        let id = id.into();
        Self {
            title: id.to_string(),
            id,
            elements: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Set the element keys
    #[must_use]
    pub fn with_elements<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements = elements.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a handler
    #[must_use]
    pub fn with_handler(mut self, handler: WebformHandler) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Enabled summary mail handlers, in attachment order
    pub fn summary_handlers(&self) -> impl Iterator<Item = &WebformHandler> {
        self.handlers
            .iter()
            .filter(|handler| handler.status && handler.plugin_id == SUMMARY_HANDLER_PLUGIN_ID)
    }
}

/// A handler instance attached to a webform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebformHandler {
    /// Instance id, unique per webform
    pub handler_id: String,

    /// Plugin type of the handler
    pub plugin_id: String,

    /// Whether the handler is enabled
    #[serde(default = "enabled")]
    pub status: bool,

    /// Summary settings; empty for handlers of other plugin types
    #[serde(default)]
    pub settings: SummaryHandlerSettings,
}

const fn enabled() -> bool {
    true
}

impl WebformHandler {
    /// Create an enabled summary mail handler
    #[must_use]
    pub fn summary(handler_id: impl Into<String>, settings: SummaryHandlerSettings) -> Self {
        Self {
            handler_id: handler_id.into(),
            plugin_id: SUMMARY_HANDLER_PLUGIN_ID.to_string(),
            status: true,
            settings,
        }
    }

    /// Disable the handler
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.status = false;
        self
    }
}

/// Per-webform override of where and what a summary is sent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryHandlerSettings {
    /// Recipient of this webform's summary
    pub recipient_mail: String,

    /// Element keys left out of the export
    pub excluded_elements: BTreeSet<String>,

    /// Whether submission metadata columns are exported
    pub metadata: bool,
}

impl SummaryHandlerSettings {
    /// Settings sending to `recipient` without metadata
    #[must_use]
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient_mail: recipient.into(),
            ..Self::default()
        }
    }

    /// Exclude an element
    #[must_use]
    pub fn exclude(mut self, element: impl Into<String>) -> Self {
        self.excluded_elements.insert(element.into());
        self
    }

    /// Include metadata columns
    #[must_use]
    pub const fn with_metadata(mut self) -> Self {
        self.metadata = true;
        self
    }

    /// The recipient, if one is configured
    #[must_use]
    pub fn recipient(&self) -> Option<&str> {
        let recipient = self.recipient_mail.trim();
        (!recipient.is_empty()).then_some(recipient)
    }
}

impl Validate for SummaryHandlerSettings {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match self.recipient() {
            None => errors.add("recipient_mail", validation::required("Recipient email address")),
            Some(recipient) if !validation::is_valid_email(recipient) => {
                errors.add("recipient_mail", validation::invalid_email(recipient));
            }
            Some(_) => {}
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Identifier of a submission within its webform
pub type SubmissionId = u64;

/// A stored webform submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Submission id
    pub sid: SubmissionId,

    /// Per-webform serial number
    #[serde(default)]
    pub serial: u64,

    /// Universally unique id
    #[serde(default)]
    pub uuid: String,

    /// Secret token for anonymous access
    #[serde(default)]
    pub token: String,

    /// Path the form was submitted from
    #[serde(default)]
    pub uri: String,

    /// Creation time
    #[serde(default)]
    pub created: DateTime<Utc>,

    /// Completion time; the range filter applies to this timestamp
    pub completed: DateTime<Utc>,

    /// Last change time
    #[serde(default)]
    pub changed: DateTime<Utc>,

    /// Draft submissions are never exported
    #[serde(default)]
    pub in_draft: bool,

    /// Wizard page the submission was saved on
    #[serde(default)]
    pub current_page: String,

    /// Submitter address
    #[serde(default)]
    pub remote_addr: String,

    /// Owning account
    #[serde(default)]
    pub uid: u64,

    /// Submission language
    #[serde(default)]
    pub langcode: String,

    /// Webform the submission belongs to
    #[serde(default)]
    pub webform_id: WebformId,

    /// Type of the entity the form was embedded in
    #[serde(default)]
    pub entity_type: String,

    /// Id of the entity the form was embedded in
    #[serde(default)]
    pub entity_id: String,

    /// Locked submissions cannot be edited
    #[serde(default)]
    pub locked: bool,

    /// Starred by an administrator
    #[serde(default)]
    pub sticky: bool,

    /// Administrative notes
    #[serde(default)]
    pub notes: String,

    /// Element values keyed by element key
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
}

impl Submission {
    /// Create a completed submission with no element data
    #[must_use]
    pub fn new(
        sid: SubmissionId,
        webform_id: impl Into<WebformId>,
        completed: DateTime<Utc>,
    ) -> Self {
        Self {
            sid,
            serial: sid,
            uuid: String::new(),
            token: String::new(),
            uri: String::new(),
            created: completed,
            completed,
            changed: completed,
            in_draft: false,
            current_page: String::new(),
            remote_addr: String::new(),
            uid: 0,
            langcode: "en".to_string(),
            webform_id: webform_id.into(),
            entity_type: String::new(),
            entity_id: String::new(),
            locked: false,
            sticky: false,
            notes: String::new(),
            data: BTreeMap::new(),
        }
    }

    /// Set an element value
    #[must_use]
    pub fn with_value(mut self, element: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(element.into(), value.into());
        self
    }

    /// Set the owning account
    #[must_use]
    pub const fn owned_by(mut self, uid: u64) -> Self {
        self.uid = uid;
        self
    }

    /// Mark the submission as a draft
    #[must_use]
    pub const fn as_draft(mut self) -> Self {
        self.in_draft = true;
        self
    }

    /// Render the value of a base or element column for export
    #[must_use]
    pub fn column_value(&self, column: &str) -> String {
        match column {
            "serial" => self.serial.to_string(),
            "sid" => self.sid.to_string(),
            "uuid" => self.uuid.clone(),
            "token" => self.token.clone(),
            "uri" => self.uri.clone(),
            "created" => format_timestamp(&self.created),
            "completed" => format_timestamp(&self.completed),
            "changed" => format_timestamp(&self.changed),
            "in_draft" => format_flag(self.in_draft),
            "current_page" => self.current_page.clone(),
            "remote_addr" => self.remote_addr.clone(),
            "uid" => self.uid.to_string(),
            "langcode" => self.langcode.clone(),
            "webform_id" => self.webform_id.to_string(),
            "entity_type" => self.entity_type.clone(),
            "entity_id" => self.entity_id.clone(),
            "locked" => format_flag(self.locked),
            "sticky" => format_flag(self.sticky),
            "notes" => self.notes.clone(),
            element => self.data.get(element).map(format_value).unwrap_or_default(),
        }
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn format_flag(flag: bool) -> String {
    String::from(if flag { "1" } else { "0" })
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => format_flag(*b),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn completed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_summary_handlers_skip_disabled_and_foreign_plugins() {
        let webform = Webform::new("contact")
            .with_handler(WebformHandler::summary("a", SummaryHandlerSettings::new("a@x.com")))
            .with_handler(
                WebformHandler::summary("b", SummaryHandlerSettings::new("b@x.com")).disabled(),
            )
            .with_handler(WebformHandler {
                handler_id: "email".to_string(),
                plugin_id: "email".to_string(),
                status: true,
                settings: SummaryHandlerSettings::new("c@x.com"),
            });

        let ids: Vec<_> = webform
            .summary_handlers()
            .map(|handler| handler.handler_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_blank_recipient_is_no_recipient() {
        assert_eq!(SummaryHandlerSettings::new("").recipient(), None);
        assert_eq!(SummaryHandlerSettings::new("   ").recipient(), None);
        assert_eq!(
            SummaryHandlerSettings::new(" r1@x.com ").recipient(),
            Some("r1@x.com")
        );
    }

    #[test]
    fn test_handler_settings_validation() {
        assert!(SummaryHandlerSettings::new("r1@x.com").validate().is_ok());

        let errors = SummaryHandlerSettings::new("").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("recipient_mail"));

        let errors = SummaryHandlerSettings::new("not-an-address").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("recipient_mail"));
    }

    #[test]
    fn test_column_values() {
        let submission = Submission::new(7, "contact", completed())
            .with_value("name", "Alice")
            .with_value("topics", serde_json::json!(["a", "b"]))
            .with_value("age", 42)
            .as_draft();

        assert_eq!(submission.column_value("sid"), "7");
        assert_eq!(submission.column_value("completed"), "2024-03-01 09:30:00");
        assert_eq!(submission.column_value("in_draft"), "1");
        assert_eq!(submission.column_value("webform_id"), "contact");
        assert_eq!(submission.column_value("name"), "Alice");
        assert_eq!(submission.column_value("topics"), "a, b");
        assert_eq!(submission.column_value("age"), "42");
        assert_eq!(submission.column_value("missing"), "");
    }

    #[test]
    fn test_handler_deserializes_with_defaults() {
        let handler: WebformHandler = serde_json::from_str(
            r#"{"handler_id": "summary", "plugin_id": "mail_summary_handler",
                "settings": {"recipient_mail": "r1@x.com", "excluded_elements": ["phone"]}}"#,
        )
        .unwrap();

        assert!(handler.status);
        assert!(!handler.settings.metadata);
        assert!(handler.settings.excluded_elements.contains("phone"));
    }
}

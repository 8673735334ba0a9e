//! Type definitions for forms, submitted values and stored responses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::schema::{check_fields, Field, FieldId, SchemaError};
use crate::steps::{partition_titled, Step};

pub type FormId = u64;
pub type ResponseId = u64;

/// Submitted values keyed by field id (JSON object keys are decimal ids)
pub type ResponseData = BTreeMap<FieldId, FieldValue>;

const DEFAULT_SUCCESS_MESSAGE: &str = "Thank you for your submission!";

// ==================== Field Values ====================

/// One submitted value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// JSON `null`, treated the same as an absent value
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Multi-valued answers such as checkbox groups
    List(Vec<String>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// String form used for comparisons and export: booleans as `true`/`false`,
/// lists joined with `,`, null as the empty string.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Value submitted for `id`, with `null` folded into "absent"
pub fn lookup(data: &ResponseData, id: FieldId) -> Option<&FieldValue> {
    data.get(&id).filter(|value| !value.is_null())
}

// ==================== Form Settings ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormStyle {
    pub primary_color: String,
    pub font_family: String,
    pub form_width: String,
}

impl Default for FormStyle {
    fn default() -> Self {
        Self {
            primary_color: "#8B7FFF".to_string(),
            font_family: "Inter".to_string(),
            form_width: "medium".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormSettings {
    pub submit_button_text: String,
    pub success_message: String,
    pub allow_multiple_submissions: bool,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            submit_button_text: "Submit".to_string(),
            success_message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            allow_multiple_submissions: true,
        }
    }
}

/// E-mail recipients notified on each accepted submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThankYouSettings {
    pub use_custom: bool,
    pub message: String,
    pub redirect_url: String,
    pub show_create_form_button: bool,
}

impl Default for ThankYouSettings {
    fn default() -> Self {
        Self {
            use_custom: false,
            message: DEFAULT_SUCCESS_MESSAGE.to_string(),
            redirect_url: String::new(),
            show_create_form_button: true,
        }
    }
}

// ==================== Form ====================

/// Form schema: ordered fields plus form-level metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: FormId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub style: FormStyle,
    #[serde(default)]
    pub settings: FormSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub thank_you: ThankYouSettings,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub publish_id: Option<Uuid>,
    #[serde(default)]
    pub submission_count: u64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Form {
    /// New unpublished form with default settings
    pub fn new(id: FormId, name: impl Into<String>, fields: Vec<Field>) -> Result<Self, SchemaError> {
        check_fields(&fields)?;
        let now = Utc::now();
        Ok(Self {
            id,
            name: name.into(),
            description: String::new(),
            fields,
            style: FormStyle::default(),
            settings: FormSettings::default(),
            notifications: NotificationSettings::default(),
            thank_you: ThankYouSettings::default(),
            is_published: false,
            publish_id: None,
            submission_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Steps of this form, each titled by the page break that opened it
    pub fn titled_steps(&self) -> Vec<Step<'_>> {
        partition_titled(&self.fields)
    }

    /// Publish the form, keeping an existing publish id
    pub fn publish(&mut self) -> Uuid {
        let publish_id = *self.publish_id.get_or_insert_with(Uuid::new_v4);
        self.is_published = true;
        self.touch();
        publish_id
    }

    pub fn unpublish(&mut self) {
        self.is_published = false;
        self.publish_id = None;
        self.touch();
    }

    pub fn record_submission(&mut self) {
        self.submission_count += 1;
    }

    /// Message and optional redirect shown after a successful submission
    pub fn completion_message(&self) -> (&str, Option<&str>) {
        if self.thank_you.use_custom {
            let redirect = Some(self.thank_you.redirect_url.as_str()).filter(|url| !url.is_empty());
            (self.thank_you.message.as_str(), redirect)
        } else {
            (self.settings.success_message.as_str(), None)
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ==================== Responses ====================

/// One stored submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: ResponseId,
    pub form_id: FormId,
    pub data: ResponseData,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_data_uses_decimal_keys() {
        let data: ResponseData = serde_json::from_value(json!({
            "1": "Ada",
            "2": true,
            "3": ["a", "b"],
            "4": null,
            "5": 42
        }))
        .unwrap();

        assert_eq!(data[&1], FieldValue::Text("Ada".into()));
        assert_eq!(data[&2], FieldValue::Bool(true));
        assert_eq!(data[&3], FieldValue::List(vec!["a".into(), "b".into()]));
        assert_eq!(lookup(&data, 4), None);
        assert_eq!(data[&5].to_string(), "42");
    }

    #[test]
    fn value_string_forms() {
        assert_eq!(FieldValue::Bool(false).to_string(), "false");
        assert_eq!(FieldValue::Number(2.5).to_string(), "2.5");
        assert_eq!(FieldValue::from(vec!["x".to_string(), "y".to_string()]).to_string(), "x,y");
        assert_eq!(FieldValue::Null.to_string(), "");
    }

    #[test]
    fn form_defaults_fill_missing_metadata() {
        let form: Form = serde_json::from_value(json!({ "id": 1, "name": "Contact" })).unwrap();
        assert_eq!(form.style.primary_color, "#8B7FFF");
        assert_eq!(form.settings.submit_button_text, "Submit");
        assert!(!form.notifications.enabled);
        assert!(form.thank_you.show_create_form_button);
        assert_eq!(form.completion_message(), ("Thank you for your submission!", None));
    }

    #[test]
    fn publish_keeps_id_until_unpublished() {
        let mut form = Form::new(1, "Survey", vec![]).unwrap();
        let first = form.publish();
        assert!(form.is_published);
        assert_eq!(form.publish(), first);

        form.unpublish();
        assert!(!form.is_published);
        assert_eq!(form.publish_id, None);
        assert_ne!(form.publish(), first);
    }

    #[test]
    fn custom_thank_you_redirect() {
        let mut form = Form::new(1, "Survey", vec![]).unwrap();
        form.thank_you.use_custom = true;
        form.thank_you.message = "Cheers".into();
        assert_eq!(form.completion_message(), ("Cheers", None));

        form.thank_you.redirect_url = "https://example.com/done".into();
        assert_eq!(
            form.completion_message(),
            ("Cheers", Some("https://example.com/done"))
        );
    }
}

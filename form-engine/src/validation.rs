//! Submission validation
//!
//! Only visible fields are checked. Each field reports at most one message,
//! from the first failing rule: required, then e-mail format, then number
//! format and range. Hidden values are left untouched.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::condition::is_visible;
use crate::schema::{Field, FieldId, FieldType};
use crate::steps::partition_steps;
use crate::types::{lookup, FieldValue, ResponseData};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid e-mail pattern"));

const INVALID_EMAIL: &str = "Please enter a valid email address";
const INVALID_NUMBER: &str = "Please enter a valid number";

/// Validation failure for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field_id: FieldId,
    pub message: String,
}

/// `local@domain.tld` check shared with notification recipients
pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_PATTERN.is_match(candidate)
}

/// Errors for every visible field, in field order; empty means acceptable
pub fn validate(fields: &[Field], data: &ResponseData) -> Vec<FieldError> {
    validate_fields(fields, data)
}

/// Errors for the visible fields of one step only (0-based index)
pub fn validate_step(fields: &[Field], step: usize, data: &ResponseData) -> Vec<FieldError> {
    partition_steps(fields)
        .get(step)
        .map(|step_fields| validate_fields(step_fields.iter().copied(), data))
        .unwrap_or_default()
}

fn validate_fields<'a>(
    fields: impl IntoIterator<Item = &'a Field>,
    data: &ResponseData,
) -> Vec<FieldError> {
    fields
        .into_iter()
        .filter(|field| field.field_type.is_input() && is_visible(field, data))
        .filter_map(|field| {
            check_field(field, lookup(data, field.id)).map(|message| FieldError {
                field_id: field.id,
                message,
            })
        })
        .collect()
}

fn check_field(field: &Field, value: Option<&FieldValue>) -> Option<String> {
    if field.required && is_blank(value) {
        return Some(format!("{} is required", field.label));
    }

    match field.field_type {
        FieldType::Email => check_email(value),
        FieldType::Number => check_number(field, value),
        _ => None,
    }
}

/// Unchecked checkboxes and empty selections count as missing
fn is_blank(value: Option<&FieldValue>) -> bool {
    match value {
        None | Some(FieldValue::Null) => true,
        Some(FieldValue::Text(s)) => s.trim().is_empty(),
        Some(FieldValue::Bool(checked)) => !checked,
        Some(FieldValue::List(items)) => items.is_empty(),
        Some(FieldValue::Number(_)) => false,
    }
}

fn check_email(value: Option<&FieldValue>) -> Option<String> {
    let address = value.and_then(FieldValue::as_text)?.trim();
    if address.is_empty() || is_valid_email(address) {
        None
    } else {
        Some(INVALID_EMAIL.to_string())
    }
}

fn check_number(field: &Field, value: Option<&FieldValue>) -> Option<String> {
    let number = match value? {
        FieldValue::Number(n) => *n,
        FieldValue::Text(s) if s.trim().is_empty() => return None,
        FieldValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => n,
            _ => return Some(INVALID_NUMBER.to_string()),
        },
        _ => return Some(INVALID_NUMBER.to_string()),
    };

    if let Some(min) = field.min.filter(|min| number < *min) {
        return Some(format!("Value must be at least {}", min));
    }
    if let Some(max) = field.max.filter(|max| number > *max) {
        return Some(format!("Value must be no more than {}", max));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Vec<Field> {
        serde_json::from_value(value).unwrap()
    }

    fn data(value: serde_json::Value) -> ResponseData {
        serde_json::from_value(value).unwrap()
    }

    fn messages(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn required_and_email_errors_in_field_order() {
        let form = fields(json!([
            { "id": 1, "type": "text", "required": true, "label": "Name" },
            { "id": 2, "type": "email", "required": true, "label": "Email" }
        ]));
        let errors = validate(&form, &data(json!({ "1": "", "2": "not-an-email" })));
        assert_eq!(
            errors,
            vec![
                FieldError { field_id: 1, message: "Name is required".into() },
                FieldError { field_id: 2, message: "Please enter a valid email address".into() },
            ]
        );

        assert!(validate(&form, &data(json!({ "1": "Ada", "2": " ada@example.com " }))).is_empty());
    }

    #[test]
    fn number_format_and_bounds() {
        let form = fields(json!([
            { "id": 3, "type": "number", "min": 0, "max": 100, "label": "Age" }
        ]));

        assert_eq!(
            messages(&validate(&form, &data(json!({ "3": "150" })))),
            vec!["Value must be no more than 100"]
        );
        assert_eq!(
            messages(&validate(&form, &data(json!({ "3": "abc" })))),
            vec!["Please enter a valid number"]
        );
        assert_eq!(
            messages(&validate(&form, &data(json!({ "3": "-0.5" })))),
            vec!["Value must be at least 0"]
        );
        assert_eq!(
            messages(&validate(&form, &data(json!({ "3": "NaN" })))),
            vec!["Please enter a valid number"]
        );
        assert!(validate(&form, &data(json!({ "3": " 42 " }))).is_empty());
        assert!(validate(&form, &data(json!({ "3": 100 }))).is_empty());
        assert!(validate(&form, &data(json!({}))).is_empty());
    }

    #[test]
    fn one_message_per_field() {
        let form = fields(json!([
            { "id": 3, "type": "number", "required": true, "min": 1, "label": "Qty" }
        ]));
        assert_eq!(
            messages(&validate(&form, &data(json!({ "3": " " })))),
            vec!["Qty is required"]
        );
    }

    #[test]
    fn unchecked_required_checkbox_is_missing() {
        let form = fields(json!([
            { "id": 4, "type": "checkbox", "required": true, "label": "Terms" }
        ]));
        assert_eq!(
            messages(&validate(&form, &data(json!({ "4": false })))),
            vec!["Terms is required"]
        );
        assert_eq!(
            messages(&validate(&form, &data(json!({ "4": [] })))),
            vec!["Terms is required"]
        );
        assert!(validate(&form, &data(json!({ "4": true }))).is_empty());
    }

    #[test]
    fn hidden_fields_are_not_validated() {
        let form = fields(json!([
            { "id": 10, "type": "radio", "label": "Contact me?", "options": ["yes", "no"] },
            { "id": 11, "type": "phone", "required": true, "label": "Phone",
              "showCondition": { "enabled": true, "fieldId": 10, "operator": "equals", "value": "yes" } }
        ]));

        assert!(validate(&form, &data(json!({ "10": "no", "11": "" }))).is_empty());
        assert_eq!(
            validate(&form, &data(json!({ "10": "yes", "11": "" }))),
            vec![FieldError { field_id: 11, message: "Phone is required".into() }]
        );
    }

    #[test]
    fn step_validation_only_checks_that_step() {
        let form = fields(json!([
            { "id": 1, "type": "text", "required": true, "label": "Name" },
            { "id": 2, "type": "page-break", "required": true, "stepTitle": "Contact" },
            { "id": 3, "type": "email", "required": true, "label": "Email" }
        ]));
        let values = data(json!({}));

        assert_eq!(messages(&validate_step(&form, 0, &values)), vec!["Name is required"]);
        assert_eq!(messages(&validate_step(&form, 1, &values)), vec!["Email is required"]);
        assert!(validate_step(&form, 2, &values).is_empty());
        assert_eq!(validate(&form, &values).len(), 2);
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("@c.d"));
    }
}

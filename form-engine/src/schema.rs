//! Field schema definitions
//!
//! A `Field` is only ever built from a `RawField` through `TryFrom`, and serde
//! deserializes through the same path, so every field held in memory satisfies
//! the structural rules checked in `Field::validate`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Field identifier, unique within one form
pub type FieldId = u64;

/// Rating scale used when a rating field does not set `maxRating`
pub const DEFAULT_MAX_RATING: u8 = 5;

const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

// ==================== Errors ====================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Unsupported field type: {0}")]
    UnsupportedType(String),

    #[error("{0} fields require at least one option")]
    MissingOptions(FieldType),

    #[error("Number field minimum value ({min}) cannot be greater than maximum value ({max})")]
    InvertedRange { min: f64, max: f64 },

    #[error("Rating field maximum rating must be between 1 and 10 (got {0})")]
    RatingOutOfRange(i64),

    #[error("Field {0} cannot be shown conditionally on its own value")]
    SelfReferencingCondition(FieldId),

    #[error("Duplicate field id {0}")]
    DuplicateFieldId(FieldId),
}

// ==================== Field Type ====================

/// Closed set of supported field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Email,
    Phone,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Number,
    Date,
    File,
    Rating,
    PageBreak,
}

impl FieldType {
    pub const ALL: [FieldType; 12] = [
        FieldType::Text,
        FieldType::Email,
        FieldType::Phone,
        FieldType::Textarea,
        FieldType::Select,
        FieldType::Radio,
        FieldType::Checkbox,
        FieldType::Number,
        FieldType::Date,
        FieldType::File,
        FieldType::Rating,
        FieldType::PageBreak,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::File => "file",
            FieldType::Rating => "rating",
            FieldType::PageBreak => "page-break",
        }
    }

    /// Page breaks only separate steps and never collect a value
    pub fn is_input(self) -> bool {
        self != FieldType::PageBreak
    }

    /// Types whose answers come from a fixed `options` list
    pub fn has_options(self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SchemaError::UnsupportedType(s.to_string()))
    }
}

// ==================== Show Condition ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    IsEmpty,
    IsNotEmpty,
}

/// Makes a field's visibility depend on another field's current value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowCondition {
    #[serde(default)]
    pub enabled: bool,
    /// Field whose value is inspected; a missing target is not an error
    #[serde(default)]
    pub field_id: Option<FieldId>,
    #[serde(default)]
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: String,
}

// ==================== Field ====================

/// Unchecked field definition as it arrives from the builder
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawField {
    pub id: FieldId,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub max_rating: Option<i64>,
    #[serde(default)]
    pub accepted_types: Option<String>,
    #[serde(default)]
    pub step_title: Option<String>,
    #[serde(default)]
    pub show_condition: Option<ShowCondition>,
}

/// One form input definition
///
/// Deserialization runs [`Field::validate`]; a field edited in place is only
/// checked again by [`check_fields`]. Rating fields always carry a scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawField")]
pub struct Field {
    pub id: FieldId,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_condition: Option<ShowCondition>,
}

impl TryFrom<RawField> for Field {
    type Error = SchemaError;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let field_type: FieldType = raw.field_type.parse()?;

        // Only rating fields carry a scale; range-check before narrowing
        let max_rating = match (field_type, raw.max_rating) {
            (FieldType::Rating, Some(rating)) if !RATING_RANGE.contains(&rating) => {
                return Err(SchemaError::RatingOutOfRange(rating));
            }
            (FieldType::Rating, Some(rating)) => Some(rating as u8),
            (FieldType::Rating, None) => Some(DEFAULT_MAX_RATING),
            _ => None,
        };

        let field = Field {
            id: raw.id,
            field_type,
            label: raw.label,
            placeholder: raw.placeholder,
            help_text: raw.help_text,
            required: raw.required,
            options: raw.options.unwrap_or_default(),
            min: raw.min,
            max: raw.max,
            max_rating,
            accepted_types: raw.accepted_types,
            step_title: raw.step_title,
            show_condition: raw.show_condition,
        };
        field.validate()?;
        Ok(field)
    }
}

impl Field {
    /// Check the structural rules for this field's type
    pub fn validate(&self) -> Result<(), SchemaError> {
        match self.field_type {
            t if t.has_options() && self.options.is_empty() => {
                return Err(SchemaError::MissingOptions(t));
            }
            FieldType::Number => {
                if let (Some(min), Some(max)) = (self.min, self.max) {
                    if min > max {
                        return Err(SchemaError::InvertedRange { min, max });
                    }
                }
            }
            FieldType::Rating => {
                if let Some(rating) = self.max_rating {
                    if !RATING_RANGE.contains(&i64::from(rating)) {
                        return Err(SchemaError::RatingOutOfRange(i64::from(rating)));
                    }
                }
            }
            _ => {}
        }

        if let Some(condition) = &self.show_condition {
            if condition.field_id == Some(self.id) {
                return Err(SchemaError::SelfReferencingCondition(self.id));
            }
        }

        Ok(())
    }
}

// ==================== Form-level checks ====================

/// Re-check every field and reject repeated ids
pub fn check_fields(fields: &[Field]) -> Result<(), SchemaError> {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        field.validate()?;
        if !seen.insert(field.id) {
            return Err(SchemaError::DuplicateFieldId(field.id));
        }
    }
    Ok(())
}

/// Ids of fields whose show condition points at a field not in `fields`
///
/// These are tolerated at runtime: the condition sees an absent value.
pub fn dangling_conditions(fields: &[Field]) -> Vec<FieldId> {
    let ids: HashSet<FieldId> = fields.iter().map(|f| f.id).collect();
    fields
        .iter()
        .filter(|field| {
            field
                .show_condition
                .as_ref()
                .and_then(|c| c.field_id)
                .is_some_and(|target| !ids.contains(&target))
        })
        .map(|field| field.id)
        .collect()
}

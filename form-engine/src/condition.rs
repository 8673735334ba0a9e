//! Show/hide condition evaluation
//!
//! Visibility of a field depends only on the *value* stored for its target
//! field, never on whether the target is itself visible, so evaluation always
//! terminates even when conditions reference each other.

use crate::schema::{ConditionOperator, Field, ShowCondition};
use crate::types::{lookup, FieldValue, ResponseData};

/// Whether `field` should be shown given the current response data
pub fn is_visible(field: &Field, data: &ResponseData) -> bool {
    match &field.show_condition {
        Some(condition) if condition.enabled => condition.is_satisfied(data),
        _ => true,
    }
}

/// Fields of `fields` that are visible, in their original order
pub fn visible_fields<'a>(fields: &'a [Field], data: &ResponseData) -> Vec<&'a Field> {
    fields.iter().filter(|field| is_visible(field, data)).collect()
}

impl ShowCondition {
    /// Apply the operator to the target field's value; an unset target never hides
    pub fn is_satisfied(&self, data: &ResponseData) -> bool {
        let Some(target_id) = self.field_id else {
            return true;
        };
        let target = lookup(data, target_id);

        match self.operator {
            ConditionOperator::Equals => equals(target, &self.value),
            ConditionOperator::NotEquals => !equals(target, &self.value),
            ConditionOperator::Contains => target.is_some_and(|value| {
                value
                    .to_string()
                    .to_lowercase()
                    .contains(&self.value.to_lowercase())
            }),
            ConditionOperator::IsEmpty => is_empty(target),
            ConditionOperator::IsNotEmpty => !is_empty(target),
        }
    }
}

fn equals(target: Option<&FieldValue>, expected: &str) -> bool {
    target.is_some_and(|value| value.to_string() == expected)
}

fn is_empty(target: Option<&FieldValue>) -> bool {
    match target {
        None => true,
        Some(FieldValue::Text(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

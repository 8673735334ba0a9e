//! Multi-step pagination at page-break fields

use serde::Serialize;

use crate::schema::{Field, FieldType};

/// One page of a multi-step form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step<'a> {
    /// `stepTitle` of the page break that opened this step
    pub title: Option<&'a str>,
    pub fields: Vec<&'a Field>,
}

/// Split `fields` into steps at page breaks.
///
/// Page breaks never appear inside a step and empty runs are dropped. There is
/// always at least one step; a form without page breaks yields one step with
/// every field.
pub fn partition_steps(fields: &[Field]) -> Vec<Vec<&Field>> {
    partition_titled(fields)
        .into_iter()
        .map(|step| step.fields)
        .collect()
}

/// Same partition as `partition_steps`, keeping each step's title
pub fn partition_titled(fields: &[Field]) -> Vec<Step<'_>> {
    let mut steps = Vec::new();
    let mut current = Step {
        title: None,
        fields: Vec::new(),
    };

    for field in fields {
        if field.field_type == FieldType::PageBreak {
            if !current.fields.is_empty() {
                steps.push(std::mem::replace(
                    &mut current,
                    Step {
                        title: None,
                        fields: Vec::new(),
                    },
                ));
            }
            // Adjacent breaks: the last one names the next step
            current.title = field.step_title.as_deref();
        } else {
            current.fields.push(field);
        }
    }

    if !current.fields.is_empty() {
        steps.push(current);
    }

    if steps.is_empty() {
        steps.push(Step {
            title: None,
            fields: Vec::new(),
        });
    }

    steps
}

//! CSV export of collected responses
//!
//! Every field of the form gets a column, whether or not it is currently
//! visible or was ever answered: the export is an audit view of stored data.

use chrono::{DateTime, NaiveDate, Utc};
use std::borrow::Cow;
use tracing::debug;

use crate::schema::{Field, FieldType};
use crate::types::{lookup, FieldValue, Form, Response};

const DELIMITER: char = ',';
const QUOTE: char = '"';
const UNTITLED_FIELD: &str = "Untitled Field";

/// e.g. `Jan 15, 2024, 3:04:05 PM`
const TIMESTAMP_FORMAT: &str = "%b %-d, %Y, %-I:%M:%S %p";
/// e.g. `Jan 15, 2024`
const DATE_FORMAT: &str = "%b %-d, %Y";

/// Render `responses` as CSV; an empty response list yields an empty string
pub fn export_to_csv<'a>(form: &Form, responses: impl IntoIterator<Item = &'a Response>) -> String {
    let mut responses = responses.into_iter().peekable();
    if responses.peek().is_none() {
        return String::new();
    }

    let mut out = String::new();

    let header = ["Response ID", "Submitted At"]
        .into_iter()
        .map(Cow::Borrowed)
        .chain(form.fields.iter().map(|field| Cow::Borrowed(header_label(field))));
    push_row(&mut out, header);

    for response in responses {
        let cells = [
            Cow::Owned(response.id.to_string()),
            Cow::Owned(format_timestamp(&response.submitted_at)),
        ]
        .into_iter()
        .chain(
            form.fields
                .iter()
                .map(|field| Cow::Owned(format_value(field, lookup(&response.data, field.id)))),
        );
        push_row(&mut out, cells);
    }

    out
}

/// Human-readable UTC timestamp, independent of any locale setting
pub(crate) fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn header_label(field: &Field) -> &str {
    if field.label.is_empty() {
        UNTITLED_FIELD
    } else {
        &field.label
    }
}

fn format_value(field: &Field, value: Option<&FieldValue>) -> String {
    let Some(value) = value else {
        return String::new();
    };

    match (field.field_type, value) {
        (FieldType::Date, FieldValue::Text(raw)) => format_date(raw),
        (FieldType::Checkbox, FieldValue::List(items)) => items.join("; "),
        _ => value.to_string(),
    }
}

/// Calendar date from `YYYY-MM-DD` or RFC 3339; anything else passes through
fn format_date(raw: &str) -> String {
    let trimmed = raw.trim();
    let parsed = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").or_else(|_| {
        DateTime::parse_from_rfc3339(trimmed).map(|at| at.with_timezone(&Utc).date_naive())
    });

    match parsed {
        Ok(date) => date.format(DATE_FORMAT).to_string(),
        Err(e) => {
            if !trimmed.is_empty() {
                debug!("Exporting unparseable date {:?} unchanged: {}", raw, e);
            }
            raw.to_string()
        }
    }
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = Cow<'a, str>>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        out.push_str(&escape_cell(&cell));
    }
    out.push('\n');
}

/// Quote cells containing the delimiter, a quote or a line break
fn escape_cell(value: &str) -> Cow<'_, str> {
    if value.contains([DELIMITER, QUOTE, '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace(QUOTE, "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

//! Response filtering for the responses dashboard

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use crate::schema::FieldId;
use crate::types::{lookup, FieldValue, Form, Response};

/// Criteria combined with AND; unset criteria match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseFilter {
    /// Case-insensitive text matched against the response id and every value
    pub search: Option<String>,
    /// Inclusive first day (UTC)
    pub start_date: Option<NaiveDate>,
    /// Inclusive last day (UTC)
    pub end_date: Option<NaiveDate>,
    /// Exact value per field; list answers match by membership
    pub field_filters: BTreeMap<FieldId, String>,
}

impl ResponseFilter {
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.field_filters.values().all(|v| v.trim().is_empty())
    }

    pub fn matches(&self, form: &Form, response: &Response) -> bool {
        self.matches_search(form, response)
            && self.matches_dates(response)
            && self.matches_fields(response)
    }

    fn matches_search(&self, form: &Form, response: &Response) -> bool {
        let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();

        if response.id.to_string().contains(&term) {
            return true;
        }

        form.fields.iter().any(|field| {
            lookup(&response.data, field.id)
                .is_some_and(|value| searchable_text(value).to_lowercase().contains(&term))
        })
    }

    fn matches_dates(&self, response: &Response) -> bool {
        let day = response.submitted_at.date_naive();
        self.start_date.map_or(true, |start| day >= start)
            && self.end_date.map_or(true, |end| day <= end)
    }

    fn matches_fields(&self, response: &Response) -> bool {
        self.field_filters
            .iter()
            .filter(|(_, wanted)| !wanted.trim().is_empty())
            .all(|(field_id, wanted)| match lookup(&response.data, *field_id) {
                None => false,
                Some(FieldValue::List(items)) => items.iter().any(|item| item == wanted),
                Some(value) => value.to_string() == *wanted,
            })
    }
}

fn searchable_text(value: &FieldValue) -> String {
    match value {
        FieldValue::List(items) => items.join(" "),
        other => other.to_string(),
    }
}

/// Responses of `responses` matching `filter`, order preserved
pub fn filter_responses<'a>(
    form: &Form,
    responses: &'a [Response],
    filter: &ResponseFilter,
) -> Vec<&'a Response> {
    responses
        .iter()
        .filter(|response| filter.matches(form, response))
        .collect()
}

/// Values offered in a field's filter drop-down.
///
/// Choice fields offer their configured options; other fields offer the
/// sorted, distinct non-empty values that were actually submitted.
pub fn filter_options(form: &Form, responses: &[Response], field_id: FieldId) -> Vec<String> {
    let Some(field) = form.field(field_id) else {
        return Vec::new();
    };

    if field.field_type.has_options() {
        return field.options.clone();
    }

    let mut values = BTreeSet::new();
    for response in responses {
        match lookup(&response.data, field_id) {
            Some(FieldValue::List(items)) => values.extend(items.iter().cloned()),
            Some(FieldValue::Text(s)) if s.is_empty() => {}
            Some(value) => {
                values.insert(value.to_string());
            }
            None => {}
        }
    }
    values.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn form() -> Form {
        serde_json::from_value(json!({
            "id": 1,
            "name": "Feedback",
            "fields": [
                { "id": 1, "type": "text", "label": "Name" },
                { "id": 2, "type": "select", "label": "Plan", "options": ["Free", "Pro"] },
                { "id": 3, "type": "checkbox", "label": "Channels" }
            ]
        }))
        .unwrap()
    }

    fn response(id: u64, day: u32, data: serde_json::Value) -> Response {
        Response {
            id,
            form_id: 1,
            data: serde_json::from_value(data).unwrap(),
            submitted_at: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
            user_agent: None,
        }
    }

    fn responses() -> Vec<Response> {
        vec![
            response(1, 1, json!({ "1": "Ada Lovelace", "2": "Pro", "3": ["Email", "Chat"] })),
            response(2, 10, json!({ "1": "Grace Hopper", "2": "Free", "3": ["Phone"] })),
            response(13, 20, json!({ "1": "Alan", "2": "Pro" })),
        ]
    }

    fn ids(found: Vec<&Response>) -> Vec<u64> {
        found.iter().map(|r| r.id).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = ResponseFilter::default();
        assert!(filter.is_empty());
        assert_eq!(ids(filter_responses(&form(), &responses(), &filter)), vec![1, 2, 13]);
    }

    #[test]
    fn search_matches_values_and_ids() {
        let all = responses();
        let mut filter = ResponseFilter {
            search: Some("  HOPPER ".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter_responses(&form(), &all, &filter)), vec![2]);

        filter.search = Some("chat".into());
        assert_eq!(ids(filter_responses(&form(), &all, &filter)), vec![1]);

        filter.search = Some("3".into());
        assert_eq!(ids(filter_responses(&form(), &all, &filter)), vec![13]);
    }

    #[test]
    fn date_range_is_inclusive() {
        let filter = ResponseFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 5, 10),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 20),
            ..Default::default()
        };
        assert_eq!(ids(filter_responses(&form(), &responses(), &filter)), vec![2, 13]);
    }

    #[test]
    fn field_filters_combine_with_other_criteria() {
        let mut filter = ResponseFilter::default();
        filter.field_filters.insert(2, "Pro".into());
        filter.field_filters.insert(1, " ".into());
        assert_eq!(ids(filter_responses(&form(), &responses(), &filter)), vec![1, 13]);

        filter.field_filters.insert(3, "Email".into());
        assert_eq!(ids(filter_responses(&form(), &responses(), &filter)), vec![1]);

        filter.field_filters.insert(3, "Phone".into());
        assert!(filter_responses(&form(), &responses(), &filter).is_empty());
    }

    #[test]
    fn options_for_choice_and_free_fields() {
        let all = responses();
        assert_eq!(filter_options(&form(), &all, 2), vec!["Free", "Pro"]);
        assert_eq!(filter_options(&form(), &all, 3), vec!["Chat", "Email", "Phone"]);
        assert_eq!(
            filter_options(&form(), &all, 1),
            vec!["Ada Lovelace", "Alan", "Grace Hopper"]
        );
        assert!(filter_options(&form(), &all, 99).is_empty());
    }
}

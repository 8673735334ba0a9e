//! Response statistics for the form dashboard

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::Response;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStats {
    pub total: usize,
    /// Submissions in the 7 days up to `now`
    pub this_week: usize,
    /// Submissions in the 7 days before that
    pub last_week: usize,
    pub trend: Trend,
    pub last_submitted_at: Option<DateTime<Utc>>,
}

pub fn response_stats<'a>(
    responses: impl IntoIterator<Item = &'a Response>,
    now: DateTime<Utc>,
) -> ResponseStats {
    let week_start = now - Duration::days(7);
    let previous_week_start = now - Duration::days(14);

    let mut total = 0;
    let mut this_week = 0;
    let mut last_week = 0;
    let mut last_submitted_at: Option<DateTime<Utc>> = None;

    for response in responses {
        let at = response.submitted_at;
        total += 1;
        if at > week_start && at <= now {
            this_week += 1;
        } else if at > previous_week_start && at <= week_start {
            last_week += 1;
        }
        if last_submitted_at.map_or(true, |latest| at > latest) {
            last_submitted_at = Some(at);
        }
    }

    let trend = match this_week.cmp(&last_week) {
        std::cmp::Ordering::Greater => Trend::Up,
        std::cmp::Ordering::Less => Trend::Down,
        std::cmp::Ordering::Equal => Trend::Stable,
    };

    ResponseStats {
        total,
        this_week,
        last_week,
        trend,
        last_submitted_at,
    }
}

//! Submission notification e-mails
//!
//! Composes the message sent to a form's recipients after an accepted
//! submission. Delivery is up to the host.

use serde::Serialize;
use thiserror::Error;

use crate::export::format_timestamp;
use crate::types::{Form, Response};
use crate::validation::is_valid_email;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("No recipients specified")]
    NoRecipients,

    #[error("Invalid email addresses: {}", .0.join(", "))]
    InvalidRecipients(Vec<String>),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Message for `response`, or `None` when the form has notifications off
pub fn compose_notification(form: &Form, response: &Response) -> Option<Notification> {
    let settings = &form.notifications;
    if !settings.enabled || settings.recipients.is_empty() {
        return None;
    }

    let details: Vec<String> = response
        .data
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(field_id, value)| {
            let label = form
                .field(*field_id)
                .map(|field| field.label.clone())
                .unwrap_or_else(|| format!("Field {}", field_id));
            format!("{}: {}", label, value)
        })
        .collect();

    let body = format!(
        "A new form submission has been received for: {}\n\nSubmission Details:\n{}\n\nSubmitted at: {}\n",
        form.name,
        details.join("\n"),
        format_timestamp(&response.submitted_at),
    );

    Some(Notification {
        recipients: settings.recipients.clone(),
        subject: format!("New form submission: {}", form.name),
        body,
    })
}

/// Reject empty or malformed recipient lists before dispatch
pub fn validate_recipients(recipients: &[String]) -> Result<(), NotifyError> {
    if recipients.is_empty() {
        return Err(NotifyError::NoRecipients);
    }

    let invalid: Vec<String> = recipients
        .iter()
        .filter(|address| !is_valid_email(address))
        .cloned()
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(NotifyError::InvalidRecipients(invalid))
    }
}

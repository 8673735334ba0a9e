//! Notification dispatch after accepted submissions

use form_engine::{validate_recipients, Notification, NotifyError};
use std::sync::Mutex;
use tracing::info;

/// Delivers composed notifications (e-mail gateway, queue, log...)
pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of sending mail
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        validate_recipients(&notification.recipients)?;
        info!(
            recipients = notification.recipients.len(),
            subject = %notification.subject,
            "Notification email queued"
        );
        Ok(())
    }
}

/// Keeps every notification in memory; handy for tests and local runs
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        validate_recipients(&notification.recipients)?;
        self.sent
            .lock()
            .map_err(|e| NotifyError::Delivery(e.to_string()))?
            .push(notification.clone());
        Ok(())
    }
}

//! In-memory form and response store
//!
//! Plays the part of the persistence collaborator: create/read/update/delete
//! over forms and responses, behind one async lock. Callers get clones.

use chrono::Utc;
use form_engine::{
    Field, Form, FormId, FormSettings, FormStyle, NotificationSettings, Response, ResponseData,
    ResponseId, SchemaError, ThankYouSettings,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Why a validated submission could not be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("Form is no longer accepting submissions")]
    Unavailable,

    #[error("Form changed after the submission was validated")]
    Stale,
}

/// Editable part of a form, as sent by the builder
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDraft {
    #[serde(default = "default_form_name")]
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
}

fn default_form_name() -> String {
    "Untitled Form".to_string()
}

impl FormDraft {
    fn into_form(self, id: FormId) -> Result<Form, SchemaError> {
        let mut form = Form::new(id, self.name, self.fields)?;
        form.description = self.description;
        form.style = self.style;
        form.settings = self.settings;
        form.notifications = self.notifications;
        form.thank_you = self.thank_you;
        Ok(form)
    }

    fn apply_to(self, form: &mut Form) {
        form.name = self.name;
        form.description = self.description;
        form.fields = self.fields;
        form.style = self.style;
        form.settings = self.settings;
        form.notifications = self.notifications;
        form.thank_you = self.thank_you;
        form.touch();
    }
}

#[derive(Debug, Default)]
struct Inner {
    forms: HashMap<FormId, Form>,
    responses: BTreeMap<ResponseId, Response>,
    last_response_id: ResponseId,
}

#[derive(Debug, Default)]
pub struct Store {
    inner: RwLock<Inner>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Forms ====================

    /// All forms, newest first
    pub async fn list_forms(&self) -> Vec<Form> {
        let inner = self.inner.read().await;
        let mut forms: Vec<Form> = inner.forms.values().cloned().collect();
        forms.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        forms
    }

    pub async fn get_form(&self, form_id: FormId) -> Option<Form> {
        self.inner.read().await.forms.get(&form_id).cloned()
    }

    /// Published form reachable under `publish_id`
    pub async fn find_published(&self, publish_id: Uuid) -> Option<Form> {
        self.inner
            .read()
            .await
            .forms
            .values()
            .find(|form| form.is_published && form.publish_id == Some(publish_id))
            .cloned()
    }

    /// Create a form with the next free id
    pub async fn create_form(&self, draft: FormDraft) -> Result<Form, SchemaError> {
        let mut inner = self.inner.write().await;
        let id = inner.forms.keys().max().map_or(1, |max| max + 1);

        let form = draft.into_form(id)?;
        inner.forms.insert(id, form.clone());
        Ok(form)
    }

    /// Insert or replace a complete form (used for seeding)
    pub async fn upsert_form(&self, form: Form) {
        self.inner.write().await.forms.insert(form.id, form);
    }

    pub async fn update_form(&self, form_id: FormId, draft: FormDraft) -> Option<Form> {
        let mut inner = self.inner.write().await;
        let form = inner.forms.get_mut(&form_id)?;
        draft.apply_to(form);
        Some(form.clone())
    }

    /// Delete a form together with its responses
    pub async fn delete_form(&self, form_id: FormId) -> bool {
        let mut inner = self.inner.write().await;
        if inner.forms.remove(&form_id).is_none() {
            return false;
        }
        inner.responses.retain(|_, response| response.form_id != form_id);
        true
    }

    pub async fn set_published(&self, form_id: FormId, published: bool) -> Option<Form> {
        let mut inner = self.inner.write().await;
        let form = inner.forms.get_mut(&form_id)?;
        if published {
            form.publish();
        } else {
            form.unpublish();
        }
        Some(form.clone())
    }

    // ==================== Responses ====================

    /// Responses of one form, oldest first
    pub async fn responses_for(&self, form_id: FormId) -> Vec<Response> {
        self.inner
            .read()
            .await
            .responses
            .values()
            .filter(|response| response.form_id == form_id)
            .cloned()
            .collect()
    }

    /// Store a submission and bump the form's submission count.
    ///
    /// `validated` is the form the data was checked against; the write is
    /// refused when the stored form has since been unpublished or edited.
    /// Returns the stored response and the form as of that submission.
    pub async fn create_response(
        &self,
        validated: &Form,
        data: ResponseData,
        user_agent: Option<String>,
    ) -> Result<(Response, Form), SubmitError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let form = inner
            .forms
            .get_mut(&validated.id)
            .filter(|form| form.is_published && form.publish_id == validated.publish_id)
            .ok_or(SubmitError::Unavailable)?;
        if form.updated_at != validated.updated_at || form.fields != validated.fields {
            return Err(SubmitError::Stale);
        }
        form.record_submission();
        let form = form.clone();

        inner.last_response_id += 1;
        let response = Response {
            id: inner.last_response_id,
            form_id: form.id,
            data,
            submitted_at: Utc::now(),
            user_agent,
        };
        inner.responses.insert(response.id, response.clone());

        Ok((response, form))
    }

    pub async fn delete_response(&self, response_id: ResponseId) -> bool {
        self.inner
            .write()
            .await
            .responses
            .remove(&response_id)
            .is_some()
    }
}

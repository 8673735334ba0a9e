//! HTTP handlers
//!
//! Management routes (behind `API-Secret`) edit forms and read responses;
//! public routes under `/f/:publish_id` serve published forms and accept
//! submissions.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use form_engine::{
    check_fields, compose_notification, dangling_conditions, export_to_csv, filter_options,
    filter_responses, response_stats, validate, validate_step, visible_fields, FieldError,
    FieldId, Form, FormId, FormSettings, FormStyle, Response, ResponseData, ResponseFilter,
    ResponseId, ResponseStats, ThankYouSettings,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::{FormDraft, SubmitError};
use crate::AppState;

const FIELD_FILTER_PREFIX: &str = "field_";

// ==================== Types ====================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptionsResponse {
    pub field_id: FieldId,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub form_id: FormId,
    pub is_published: bool,
    pub publish_id: Option<Uuid>,
}

/// Step of a rendered form, fields referenced by id
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub title: Option<String>,
    pub field_ids: Vec<FieldId>,
}

/// Published form as served to respondents (no notification recipients)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicForm {
    pub id: FormId,
    pub name: String,
    pub description: String,
    pub fields: Vec<form_engine::Field>,
    pub style: FormStyle,
    pub settings: FormSettings,
    pub thank_you: ThankYouSettings,
    pub steps: Vec<StepView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    #[serde(default)]
    pub data: ResponseData,
    /// 0-based step to validate; the whole form when absent
    #[serde(default)]
    pub step: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub visible_field_ids: Vec<FieldId>,
    pub steps: Vec<StepView>,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub data: ResponseData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub response_id: ResponseId,
    pub message: String,
    pub redirect_url: Option<String>,
}

// ==================== Helpers ====================

/// Steps of `form`, keeping only the fields in `keep`
fn step_views(form: &Form, keep: impl Fn(FieldId) -> bool) -> Vec<StepView> {
    form.titled_steps()
        .into_iter()
        .map(|step| StepView {
            title: step.title.map(str::to_string),
            field_ids: step
                .fields
                .iter()
                .map(|field| field.id)
                .filter(|id| keep(*id))
                .collect(),
        })
        .collect()
}

/// Structural checks shared by create and update
fn check_draft(draft: &FormDraft) -> Result<(), ApiError> {
    check_fields(&draft.fields)?;
    let dangling = dangling_conditions(&draft.fields);
    if !dangling.is_empty() {
        warn!(
            "Form {:?} has show conditions referencing missing fields on fields {:?}",
            draft.name, dangling
        );
    }
    Ok(())
}

/// Build a filter from `search`, `start_date`, `end_date` and `field_<id>` parameters
fn parse_filter(params: HashMap<String, String>) -> Result<ResponseFilter, ApiError> {
    let mut filter = ResponseFilter::default();

    for (key, value) in params {
        match key.as_str() {
            "search" => filter.search = Some(value),
            "start_date" => filter.start_date = Some(parse_date(&key, &value)?),
            "end_date" => filter.end_date = Some(parse_date(&key, &value)?),
            other => {
                let field_id = other
                    .strip_prefix(FIELD_FILTER_PREFIX)
                    .and_then(|id| id.parse::<FieldId>().ok())
                    .ok_or_else(|| ApiError::BadRequest(format!("Unknown filter: {}", other)))?;
                filter.field_filters.insert(field_id, value);
            }
        }
    }

    Ok(filter)
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("{} must be a YYYY-MM-DD date", key)))
}

async fn load_form(state: &AppState, form_id: FormId) -> Result<Form, ApiError> {
    state.store.get_form(form_id).await.ok_or(ApiError::FormNotFound)
}

async fn load_published(state: &AppState, publish_id: Uuid) -> Result<Form, ApiError> {
    state
        .store
        .find_published(publish_id)
        .await
        .ok_or(ApiError::FormNotFound)
}

async fn filtered_responses(
    state: &AppState,
    form: &Form,
    params: HashMap<String, String>,
) -> Result<Vec<Response>, ApiError> {
    let filter = parse_filter(params)?;
    let responses = state.store.responses_for(form.id).await;
    if filter.is_empty() {
        return Ok(responses);
    }
    Ok(filter_responses(form, &responses, &filter)
        .into_iter()
        .cloned()
        .collect())
}

// ==================== Management Handlers ====================

/// GET /health - Health check (no auth required)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /forms - List forms, newest first
pub async fn list_forms(State(state): State<AppState>) -> Json<Vec<Form>> {
    Json(state.store.list_forms().await)
}

/// POST /forms - Create a form from a builder draft
pub async fn create_form(
    State(state): State<AppState>,
    payload: Result<Json<FormDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Form>), ApiError> {
    let Json(draft) = payload?;
    check_draft(&draft)?;

    let form = state.store.create_form(draft).await?;
    info!("Created form {} ({} fields)", form.id, form.fields.len());

    Ok((StatusCode::CREATED, Json(form)))
}

/// GET /forms/:form_id - Get one form with its settings
pub async fn get_form(
    State(state): State<AppState>,
    Path(form_id): Path<FormId>,
) -> Result<Json<Form>, ApiError> {
    Ok(Json(load_form(&state, form_id).await?))
}

/// PUT /forms/:form_id - Replace the editable parts of a form
pub async fn update_form(
    State(state): State<AppState>,
    Path(form_id): Path<FormId>,
    payload: Result<Json<FormDraft>, JsonRejection>,
) -> Result<Json<Form>, ApiError> {
    let Json(draft) = payload?;
    check_draft(&draft)?;

    let form = state
        .store
        .update_form(form_id, draft)
        .await
        .ok_or(ApiError::FormNotFound)?;
    info!("Updated form {}", form.id);

    Ok(Json(form))
}

/// DELETE /forms/:form_id - Delete a form and all of its responses
pub async fn delete_form(
    State(state): State<AppState>,
    Path(form_id): Path<FormId>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_form(form_id).await {
        return Err(ApiError::FormNotFound);
    }
    info!("Deleted form {}", form_id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /forms/:form_id/publish - Make the form reachable under a publish id
pub async fn publish_form(
    State(state): State<AppState>,
    Path(form_id): Path<FormId>,
) -> Result<Json<PublishResponse>, ApiError> {
    set_published(state, form_id, true).await
}

/// POST /forms/:form_id/unpublish - Stop accepting submissions
pub async fn unpublish_form(
    State(state): State<AppState>,
    Path(form_id): Path<FormId>,
) -> Result<Json<PublishResponse>, ApiError> {
    set_published(state, form_id, false).await
}

async fn set_published(
    state: AppState,
    form_id: FormId,
    published: bool,
) -> Result<Json<PublishResponse>, ApiError> {
    let form = state
        .store
        .set_published(form_id, published)
        .await
        .ok_or(ApiError::FormNotFound)?;
    info!(
        "Form {} {} (publish id {:?})",
        form.id,
        if published { "published" } else { "unpublished" },
        form.publish_id
    );

    Ok(Json(PublishResponse {
        form_id: form.id,
        is_published: form.is_published,
        publish_id: form.publish_id,
    }))
}

/// GET /forms/:form_id/responses - List responses matching the query filters
pub async fn list_responses(
    State(state): State<AppState>,
    Path(form_id): Path<FormId>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Vec<Response>>, ApiError> {
    let Query(params) = params?;
    let form = load_form(&state, form_id).await?;
    Ok(Json(filtered_responses(&state, &form, params).await?))
}

/// GET /forms/:form_id/responses/export - Download matching responses as CSV
pub async fn export_responses(
    State(state): State<AppState>,
    Path(form_id): Path<FormId>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let form = load_form(&state, form_id).await?;
    let responses = filtered_responses(&state, &form, params).await?;

    let csv = export_to_csv(&form, &responses);
    info!("Exported {} responses of form {}", responses.len(), form.id);

    let disposition = format!("attachment; filename=\"form-{}-responses.csv\"", form.id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// GET /forms/:form_id/fields/:field_id/options - Values for a field's response filter
pub async fn field_filter_options(
    State(state): State<AppState>,
    Path((form_id, field_id)): Path<(FormId, FieldId)>,
) -> Result<Json<FilterOptionsResponse>, ApiError> {
    let form = load_form(&state, form_id).await?;
    if form.field(field_id).is_none() {
        return Err(ApiError::FieldNotFound);
    }

    let responses = state.store.responses_for(form.id).await;
    Ok(Json(FilterOptionsResponse {
        field_id,
        options: filter_options(&form, &responses, field_id),
    }))
}

/// GET /forms/:form_id/stats - Response totals and weekly trend
pub async fn form_stats(
    State(state): State<AppState>,
    Path(form_id): Path<FormId>,
) -> Result<Json<ResponseStats>, ApiError> {
    let form = load_form(&state, form_id).await?;
    let responses = state.store.responses_for(form.id).await;
    Ok(Json(response_stats(&responses, Utc::now())))
}

/// DELETE /responses/:response_id - Delete one response
pub async fn delete_response(
    State(state): State<AppState>,
    Path(response_id): Path<ResponseId>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_response(response_id).await {
        return Err(ApiError::ResponseNotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Public Handlers ====================

/// GET /f/:publish_id - Published form with its steps
pub async fn get_published(
    State(state): State<AppState>,
    Path(publish_id): Path<Uuid>,
) -> Result<Json<PublicForm>, ApiError> {
    let form = load_published(&state, publish_id).await?;
    let steps = step_views(&form, |_| true);

    Ok(Json(PublicForm {
        id: form.id,
        name: form.name,
        description: form.description,
        fields: form.fields,
        style: form.style,
        settings: form.settings,
        thank_you: form.thank_you,
        steps,
    }))
}

/// POST /f/:publish_id/evaluate - Visibility, steps and errors for in-progress answers
pub async fn evaluate(
    State(state): State<AppState>,
    Path(publish_id): Path<Uuid>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let Json(request) = payload?;
    let form = load_published(&state, publish_id).await?;

    let visible_field_ids: Vec<FieldId> = visible_fields(&form.fields, &request.data)
        .into_iter()
        .filter(|field| field.field_type.is_input())
        .map(|field| field.id)
        .collect();
    let steps = step_views(&form, |id| visible_field_ids.contains(&id));

    let errors = match request.step {
        Some(step) => validate_step(&form.fields, step, &request.data),
        None => validate(&form.fields, &request.data),
    };

    Ok(Json(EvaluateResponse {
        visible_field_ids,
        steps,
        errors,
    }))
}

/// POST /f/:publish_id/submissions - Validate and store a submission
pub async fn submit(
    State(state): State<AppState>,
    Path(publish_id): Path<Uuid>,
    headers: HeaderMap,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let Json(request) = payload?;
    let form = load_published(&state, publish_id).await?;

    let errors = validate(&form.fields, &request.data);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let (response, form) = state
        .store
        .create_response(&form, request.data, user_agent)
        .await
        .map_err(|e| match e {
            SubmitError::Unavailable => ApiError::FormNotFound,
            SubmitError::Stale => ApiError::FormChanged,
        })?;
    info!("Stored response {} for form {}", response.id, form.id);

    // Delivery problems never fail an accepted submission
    if let Some(notification) = compose_notification(&form, &response) {
        if let Err(e) = state.notifier.send(&notification) {
            warn!("Failed to send notification for response {}: {}", response.id, e);
        }
    }

    let (message, redirect_url) = form.completion_message();
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            response_id: response.id,
            message: message.to_string(),
            redirect_url: redirect_url.map(str::to_string),
        }),
    ))
}

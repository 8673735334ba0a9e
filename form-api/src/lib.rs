//! HTTP API for form-engine
//!
//! Hosts the pure engine behind REST endpoints: form management and response
//! export for form owners, plus rendering and submission of published forms.

pub mod config;
pub mod error;
pub mod notifier;
pub mod routes;
pub mod store;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use form_engine::Form;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

use crate::notifier::Notifier;
use crate::store::Store;

/// Example forms loaded at start-up when seeding is enabled
const SEED_FORMS_JSON: &str = include_str!("../seed/forms.json");

/// Request bodies above this size are rejected
const MAX_BODY_BYTES: usize = 250 * 1024;

// ==================== App State ====================

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub notifier: Arc<dyn Notifier>,
    api_secret: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<Store>, notifier: Arc<dyn Notifier>, api_secret: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            notifier,
            api_secret: api_secret.into(),
        }
    }
}

// ==================== Middleware ====================

/// Middleware to verify API-Secret header (constant-time comparison)
async fn require_api_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    use constant_time_eq::constant_time_eq;

    let header = request
        .headers()
        .get("API-Secret")
        .and_then(|h| h.to_str().ok());

    let provided = header.map(|h| h.as_bytes()).unwrap_or(&[]);
    if !constant_time_eq(provided, state.api_secret.as_bytes()) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

// ==================== Router ====================

pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/forms", get(routes::list_forms).post(routes::create_form))
        .route(
            "/forms/:form_id",
            get(routes::get_form)
                .put(routes::update_form)
                .delete(routes::delete_form),
        )
        .route("/forms/:form_id/publish", post(routes::publish_form))
        .route("/forms/:form_id/unpublish", post(routes::unpublish_form))
        .route("/forms/:form_id/responses", get(routes::list_responses))
        .route(
            "/forms/:form_id/responses/export",
            get(routes::export_responses),
        )
        .route(
            "/forms/:form_id/fields/:field_id/options",
            get(routes::field_filter_options),
        )
        .route("/forms/:form_id/stats", get(routes::form_stats))
        .route("/responses/:response_id", delete(routes::delete_response))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_secret,
        ));

    let public_routes = Router::new()
        .route("/health", get(routes::health))
        .route("/f/:publish_id", get(routes::get_published))
        .route("/f/:publish_id/evaluate", post(routes::evaluate))
        .route("/f/:publish_id/submissions", post(routes::submit));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

// ==================== Seeding ====================

/// Parse the embedded example forms
pub fn seed_forms() -> Result<Vec<Form>, serde_json::Error> {
    serde_json::from_str(SEED_FORMS_JSON)
}

/// Load the embedded example forms into `store`, returning how many were added
pub async fn seed_store(store: &Store) -> Result<usize, serde_json::Error> {
    let forms = seed_forms()?;
    let count = forms.len();
    for form in forms {
        info!("Seeded form {} ({})", form.id, form.name);
        store.upsert_form(form).await;
    }
    Ok(count)
}

//! API error type and its HTTP mapping

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use form_engine::{FieldError, SchemaError};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Form not found")]
    FormNotFound,

    #[error("Response not found")]
    ResponseNotFound,

    #[error("Field not found")]
    FieldNotFound,

    #[error("This form was changed while you were filling it in; please reload and try again")]
    FormChanged,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Please correct the errors below before submitting")]
    Validation(Vec<FieldError>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::FormNotFound | ApiError::ResponseNotFound | ApiError::FieldNotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::FormChanged => StatusCode::CONFLICT,
            ApiError::BadRequest(_) | ApiError::Schema(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };

        debug!("Request rejected ({}): {}", status, self);
        let error = self.to_string();

        let field_errors = match self {
            ApiError::Validation(errors) => errors,
            _ => Vec::new(),
        };

        (status, Json(ErrorResponse { error, field_errors })).into_response()
    }
}

use thiserror::Error;

use crate::domain::error::DomainError;
use crate::infrastructure::error::{FetchError, RenderError};

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("Invalid request body: {0}")]
    MalformedRequest(String),

    #[error("Request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("Rate limit exceeded. Maximum {limit} requests per {window_secs} seconds.")]
    RateLimited { limit: u32, window_secs: u64 },

    #[error("Method not allowed. Use POST.")]
    MethodNotAllowed,

    /// The payload is diagnostic detail; clients only see it outside production.
    #[error("Internal server error")]
    Internal(String),
}

impl ApplicationError {
    pub fn with_details(self, expose_details: bool) -> ErrorResponse {
        ErrorResponse {
            error: self,
            expose_details,
        }
    }
}

/// Why a single slide could not be produced. Recorded on that slide only.
#[derive(Error, Debug)]
pub enum SlideError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

// IntoResponse implementation for ApplicationError
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// [`ApplicationError`] plus whether internal details may be shown to the caller.
#[derive(Debug)]
pub struct ErrorResponse {
    pub error: ApplicationError,
    pub expose_details: bool,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = match &self.error {
            ApplicationError::Validation(_) | ApplicationError::MalformedRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApplicationError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApplicationError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApplicationError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApplicationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({ "success": false, "error": self.error.to_string() });
        if let ApplicationError::Internal(details) = &self.error {
            tracing::error!(details = %details, "carousel request failed");
            if self.expose_details {
                body["details"] = json!(details);
            }
        }

        let mut response = (status, Json(body)).into_response();
        if let ApplicationError::RateLimited { window_secs, .. } = &self.error {
            if let Ok(value) = HeaderValue::from_str(&(*window_secs).max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        self.with_details(false).into_response()
    }
}

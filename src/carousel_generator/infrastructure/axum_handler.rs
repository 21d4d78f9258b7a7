use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::rate_limiter::RateLimiter;
use crate::application::carousel_service::{BatchRequest, CarouselService, UploadTarget};
use crate::application::error::{ApplicationError, ErrorResponse};
use crate::domain::dimensions::DEFAULT_DIMENSION;
use crate::domain::slide::{BatchStats, SlideResult, SlideSpec, UploadResult};

#[derive(Clone)]
pub struct AppState {
    pub carousel_service: Arc<CarouselService>,
    pub rate_limiter: RateLimiter,
    pub expose_error_details: bool,
    /// Upper bound for a request body; `data:` backgrounds make requests large.
    pub max_body_bytes: usize,
}

// リクエスト DTO。省略されたフィールドは既定値で補う
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CarouselRequest {
    #[serde(default)]
    pub backgrounds: Option<Vec<String>>,
    #[serde(default)]
    pub slides: Option<Vec<SlideSpec>>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub upload_requested: bool,
    #[serde(default)]
    pub upload_credential: Option<String>,
    #[serde(default)]
    pub upload_folder: Option<String>,
}

impl CarouselRequest {
    fn into_batch(self) -> BatchRequest {
        let upload = match (self.upload_requested, self.upload_credential) {
            (true, Some(credential)) if !credential.trim().is_empty() => Some(UploadTarget {
                credential,
                folder_id: self.upload_folder.filter(|folder| !folder.is_empty()),
            }),
            (true, _) => {
                warn!("upload requested without a credential; skipping upload");
                None
            }
            (false, _) => None,
        };

        BatchRequest {
            backgrounds: self.backgrounds.unwrap_or_default(),
            slides: self.slides.unwrap_or_default(),
            width: self.width.unwrap_or(i64::from(DEFAULT_DIMENSION)),
            height: self.height.unwrap_or(i64::from(DEFAULT_DIMENSION)),
            upload,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CarouselResponse {
    pub success: bool,
    pub images: Vec<SlideResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<SlideResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub upload_results: Vec<UploadResult>,
    pub stats: BatchStats,
}

pub async fn generate_carousel_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CarouselRequest>, JsonRejection>,
) -> Result<Json<CarouselResponse>, ErrorResponse> {
    let expose = state.expose_error_details;
    let Json(request) = payload.map_err(|rejection| {
        let error = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApplicationError::PayloadTooLarge {
                limit: state.max_body_bytes,
            }
        } else {
            ApplicationError::MalformedRequest(rejection.body_text())
        };
        error.with_details(expose)
    })?;

    // バッチ全体を別タスクで実行し、パニックは 500 として返す
    let service = Arc::clone(&state.carousel_service);
    let outcome = tokio::spawn(async move { service.run_batch(request.into_batch()).await })
        .await
        .map_err(|err| ApplicationError::Internal(err.to_string()).with_details(expose))?
        .map_err(|err| err.with_details(expose))?;

    Ok(Json(CarouselResponse {
        success: true,
        images: outcome.successful,
        failed: outcome.failed,
        upload_results: outcome.upload_results,
        stats: outcome.stats,
    }))
}

pub async fn method_not_allowed_handler() -> ApplicationError {
    ApplicationError::MethodNotAllowed
}

pub async fn health_handler() -> &'static str {
    "ok"
}

/// First `x-forwarded-for` entry, then `client-ip`, then `"unknown"`.
pub fn client_identity(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let client_ip = || {
        headers
            .get("client-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    forwarded
        .or_else(client_ip)
        .unwrap_or("unknown")
        .to_string()
}

/// Counts POST requests per client before the body is read.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let client = client_identity(request.headers());
    let limiter = &state.rate_limiter;
    if !limiter.allow(&client) {
        warn!(client = %client, "rate limit exceeded");
        return ApplicationError::RateLimited {
            limit: limiter.limit(),
            window_secs: limiter.retry_after_secs(),
        }
        .into_response();
    }
    next.run(request).await
}

pub fn router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);
    let state = Arc::new(state);
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // OPTIONS は CorsLayer が空の 200 で応答する
    let carousel = post(generate_carousel_handler).fallback(method_not_allowed_handler);

    Router::new()
        .route("/", carousel.clone())
        .route("/carousel", carousel)
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            rate_limit_middleware,
        ))
        .route("/health", get(health_handler))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

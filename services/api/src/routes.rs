use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use inquiry_desk::inquiries::{inquiry_router, InquiryNotifier, InquiryService, InquiryStore};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::warn;

pub(crate) fn with_inquiry_routes<S, N>(service: Arc<InquiryService<S, N>>) -> Router
where
    S: InquiryStore,
    N: InquiryNotifier,
{
    inquiry_router(service)
        .route("/api/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/admin", get(admin_dashboard))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "Server is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Serves the static admin dashboard page from the configured path.
pub(crate) async fn admin_dashboard(Extension(state): Extension<AppState>) -> Response {
    let path = state.dashboard_path.as_path();
    match tokio::fs::read(path).await {
        Ok(contents) => {
            let mime = mime_guess::from_path(path).first_or_text_plain();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.essence_str().to_string())],
                contents,
            )
                .into_response()
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "admin dashboard unavailable");
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "error": "admin dashboard not found" })),
            )
                .into_response()
        }
    }
}

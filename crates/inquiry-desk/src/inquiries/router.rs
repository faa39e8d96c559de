use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{ConnectInfo, FromRequest, Path, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use super::domain::InquirySubmission;
use super::notifier::InquiryNotifier;
use super::service::{InquiryService, InquiryServiceError};
use super::store::InquiryStore;
use crate::error::AppError;

/// Router builder exposing the public contact endpoint and the admin listing.
pub fn inquiry_router<S, N>(service: Arc<InquiryService<S, N>>) -> Router
where
    S: InquiryStore,
    N: InquiryNotifier,
{
    Router::new()
        .route("/api/contact", post(submit_handler::<S, N>))
        .route("/api/admin/inquiries", get(list_handler::<S, N>))
        .route(
            "/api/admin/inquiries/:id/status",
            put(update_status_handler::<S, N>),
        )
        .with_state(service)
}

/// Contact form body as browsers and scripts send it.
///
/// Accepts camelCase or snake_case names, and a single `name` field that is split
/// into first and last name when the explicit fields are absent.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    #[serde(default, alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(default, alias = "last_name")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub phone: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ContactForm {
    pub fn into_submission(self, ip_address: String) -> InquirySubmission {
        let ContactForm {
            mut first_name,
            mut last_name,
            name,
            email,
            phone,
            service,
            message,
        } = self;

        let blank = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());

        if blank(&first_name) {
            if let Some(full_name) = name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                let (first, rest) = full_name
                    .split_once(char::is_whitespace)
                    .unwrap_or((full_name, ""));
                first_name = Some(first.to_string());
                if blank(&last_name) {
                    last_name = Some(rest.trim().to_string());
                }
            }
        }

        InquirySubmission {
            first_name,
            last_name,
            email,
            phone,
            service,
            message,
            ip_address,
        }
    }
}

/// Phone numbers arrive as JSON numbers from some embed scripts.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LooseString;

    impl<'de> Visitor<'de> for LooseString {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, inner: D2) -> Result<Self::Value, D2::Error> {
            inner.deserialize_any(LooseString)
        }
    }

    deserializer.deserialize_any(LooseString)
}

/// Extracts a [`ContactForm`] from either a JSON or URL-encoded body.
pub struct ContactPayload(pub ContactForm);

#[async_trait]
impl<St> FromRequest<St> for ContactPayload
where
    St: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if content_type == "application/x-www-form-urlencoded" {
            let Form(form) = Form::<ContactForm>::from_request(req, state)
                .await
                .map_err(|_| invalid_body())?;
            return Ok(Self(form));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(ContactForm::default()));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|_| invalid_body())
    }
}

fn invalid_body() -> Response {
    contact_failure(StatusCode::BAD_REQUEST, "invalid request body")
}

fn contact_failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "ok": false, "error": message }))).into_response()
}

pub(crate) async fn submit_handler<S, N>(
    State(service): State<Arc<InquiryService<S, N>>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    ContactPayload(form): ContactPayload,
) -> Response
where
    S: InquiryStore,
    N: InquiryNotifier,
{
    let ip_address = peer
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default();

    match service.submit(form.into_submission(ip_address)).await {
        Ok(inquiry) => {
            let payload = json!({
                "ok": true,
                "inquiryId": inquiry.id,
                "message": "Inquiry received",
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(InquiryServiceError::Validation(err)) => {
            contact_failure(StatusCode::BAD_REQUEST, &err.to_string())
        }
        Err(other) => {
            error!(error = %other, "failed to store inquiry");
            contact_failure(StatusCode::INTERNAL_SERVER_ERROR, "failed to save inquiry")
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
}

pub(crate) async fn list_handler<S, N>(
    State(service): State<Arc<InquiryService<S, N>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, AppError>
where
    S: InquiryStore,
    N: InquiryNotifier,
{
    let page = service
        .list_page(
            query.status.as_deref(),
            query.page.as_deref(),
            query.limit.as_deref(),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "inquiries": page.items,
        "pagination": page.pagination,
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<String>,
}

pub(crate) async fn update_status_handler<S, N>(
    State(service): State<Arc<InquiryService<S, N>>>,
    Path(id): Path<String>,
    body: Option<Json<StatusUpdate>>,
) -> Result<Json<Value>, AppError>
where
    S: InquiryStore,
    N: InquiryNotifier,
{
    let status = body.and_then(|Json(update)| update.status);
    service.update_status(&id, status.as_deref()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Status updated successfully",
    })))
}

use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_inquiry_routes;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use axum_prometheus::PrometheusMetricLayer;
use inquiry_desk::config::{AppConfig, ServerConfig};
use inquiry_desk::error::AppError;
use inquiry_desk::inquiries::{InquiryService, InquiryStore, MailNotifier, SqliteInquiryStore};
use inquiry_desk::telemetry;
use serde_json::json;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let store = Arc::new(
        SqliteInquiryStore::connect(
            config.database.require_url()?,
            config.database.max_connections,
        )
        .await?,
    );
    store.initialize().await?;

    let notifier = Arc::new(MailNotifier::from_config(&config.mail)?);
    let inquiry_service = Arc::new(InquiryService::with_notify_timeout(
        store.clone(),
        notifier,
        config.mail.timeout,
    ));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        dashboard_path: Arc::new(config.admin.dashboard_path.clone()),
    };

    let app = with_inquiry_routes(inquiry_service.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "inquiry desk ready");

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(readiness_flag))
    .await;

    inquiry_service
        .drain_notifications(config.mail.timeout)
        .await;
    store.close().await;
    served?;
    info!("inquiry desk stopped");
    Ok(())
}

/// Restricts cross-origin access to the configured origins; no list means any origin.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_headers(cors::Any)
        .allow_methods(cors::Any);
    if origins.is_empty() {
        layer.allow_origin(cors::Any)
    } else {
        layer.allow_origin(origins)
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": "internal server error" })),
    )
        .into_response()
}

async fn shutdown_signal(readiness: Arc<AtomicBool>) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install CTRL+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => warn!(error = %err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    readiness.store(false, Ordering::Release);
    info!("shutdown signal received; draining connections");
}

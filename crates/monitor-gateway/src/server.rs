//! HTTP server implementation using axum.

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use monitor_feed::FeedError;
use monitor_telemetry::Metrics;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::source::PriceSource;

const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn PriceSource>,
}

impl AppState {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_prices))
        .route("/api/prices", get(get_prices))
        .route("/health", get(get_health))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Current price table.
async fn get_prices(State(state): State<AppState>) -> Response {
    match state.source.prices() {
        Ok(prices) => Json(prices).into_response(),
        Err(e) if e.is_not_ready() => {
            debug!(error = %e, "Price query before cache is warm");
            error_response(StatusCode::SERVICE_UNAVAILABLE, &e)
        }
        Err(e) => {
            warn!(error = %e, "Price query failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
        }
    }
}

/// Cache status.
async fn get_health(State(state): State<AppState>) -> Response {
    Json(state.source.status()).into_response()
}

/// Prometheus exposition.
async fn get_metrics() -> Response {
    match Metrics::gather_text() {
        Ok(text) => ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], text).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn error_response(status: StatusCode, err: &FeedError) -> Response {
    let body = serde_json::json!({ "error": err.to_string() });
    (status, Json(body)).into_response()
}

/// Bind and serve until `shutdown` resolves.
///
/// In-flight requests are drained before this returns.
pub async fn run_server<F>(
    source: Arc<dyn PriceSource>,
    config: GatewayConfig,
    shutdown: F,
) -> GatewayResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::Bind { addr, source })?;
    info!(%addr, "Starting price gateway");

    let app = create_router(AppState::new(source));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Price gateway stopped");
    Ok(())
}

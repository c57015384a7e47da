//! API Routes
//!
//! HTTP endpoints for status, neighbors, configuration, and metrics

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::Metrics;
use crate::monitor::NodeMonitor;

/// Shared API state
pub struct ApiState {
    pub monitor: Arc<NodeMonitor>,
    pub metrics: Arc<Metrics>,
}

/// Run the HTTP API server
pub async fn run_api_server(
    monitor: Arc<NodeMonitor>,
    metrics: Arc<Metrics>,
) -> anyhow::Result<()> {
    let api_port = monitor.config().await.api_port;
    let state = Arc::new(ApiState { monitor, metrics });

    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], api_port));
    info!("📊 HTTP API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health & Status
        .route("/health", get(health_check))
        .route("/status", get(get_status))

        // Operator configuration
        .route("/config", get(get_config).post(post_config))

        // Neighbor view
        .route("/neighbors", get(get_neighbors))

        // Metrics
        .route("/metrics", get(get_metrics_prometheus))
        .route("/metrics/json", get(get_metrics_json))

        // The node GUI calls these endpoints from the browser
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// GET /health - Simple health check
async fn health_check() -> impl IntoResponse {
    "OK"
}

/// GET /status - Detailed status
async fn get_status(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let metadata = state.monitor.metadata().await;

    let status = serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.metrics.uptime_secs(),
        "time": chrono::Utc::now().to_rfc3339(),
        "identity": state.monitor.identity().await,
        "node": {
            "version": metadata.version,
            "round_duration_ms": metadata.round_duration_ms,
            "neighbor_count": state.monitor.neighbors().len(),
        }
    });

    Json(status)
}

/// GET /config - Current configuration document (resyncs neighbors first)
async fn get_config(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(state.monitor.get_configuration().await)
}

/// POST /config - Validate and apply a configuration document
async fn post_config(
    State(state): State<Arc<ApiState>>,
    Json(proposed): Json<serde_json::Value>,
) -> axum::response::Response {
    match state.monitor.apply_configuration(&proposed).await {
        Ok(()) => Json(serde_json::json!({"accepted": true})).into_response(),
        Err(rejection) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "accepted": false,
                "error": rejection.to_string(),
            })),
        )
            .into_response(),
    }
}

/// GET /neighbors - Reconciled neighbor snapshot
async fn get_neighbors(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let neighbors = state.monitor.neighbors();

    Json(serde_json::json!({
        "count": neighbors.len(),
        "neighbors": neighbors,
    }))
}

/// GET /metrics - Prometheus format metrics
async fn get_metrics_prometheus(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    // Update gauges from monitor state
    let metadata = state.monitor.metadata().await;
    state.metrics.set_neighbor_count(state.monitor.neighbors().len() as u64);
    state.metrics.set_round_duration_ms(metadata.round_duration_ms);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.metrics.to_prometheus(),
    )
}

/// GET /metrics/json - JSON format metrics
async fn get_metrics_json(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    // Update gauges from monitor state
    let metadata = state.monitor.metadata().await;
    state.metrics.set_neighbor_count(state.monitor.neighbors().len() as u64);
    state.metrics.set_round_duration_ms(metadata.round_duration_ms);

    Json(state.metrics.to_json())
}

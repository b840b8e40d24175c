//! HTTP routes for Agent Host.
//!
//! Defines the Axum router and application state. Protected routes sit
//! behind the access gate; `/health` and `/metrics` are public.

use crate::auth::{Session, TokenValidator};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{access_gate, GateState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Process-local session state.
    pub session: Arc<Session>,

    /// Token validator backed by the key set cache.
    pub validator: Arc<TokenValidator>,
}

/// Install the Prometheus metrics recorder.
///
/// Must be called once per process, before any metric is recorded.
///
/// # Errors
///
/// Returns `BuildError` if a global recorder is already installed.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Build the application routes.
///
/// - `/health` - public liveness probe
/// - `/metrics` - public Prometheus scrape endpoint
/// - `/api/v1/*` - protected by the access gate
///
/// Global layers: request tracing and a 30 second timeout.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let gate_state = Arc::new(GateState {
        validator: Arc::clone(&state.validator),
        session: Arc::clone(&state.session),
    });

    // Protected routes (behind the access gate)
    let protected_routes = Router::new()
        .route("/api/v1/me", get(handlers::get_me))
        .route("/api/v1/status", get(handlers::get_status))
        .route("/api/v1/register", post(handlers::register))
        .layer(middleware::from_fn_with_state(gate_state, access_gate))
        .with_state(state);

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(handlers::metrics_handler).with_state(metrics_handle),
        );

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - timeout the request (innermost)
    // 2. TraceLayer - log request details
    public_routes
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}

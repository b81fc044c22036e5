use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Telemetry endpoints ─────────────────────────────────
        .route(
            "/api/telemetry/percentiles",
            get(handlers::telemetry::get_percentiles),
        )
        .route(
            "/api/telemetry/samples",
            post(handlers::telemetry::ingest_samples),
        )
        .route(
            "/api/telemetry/cache/clear",
            post(handlers::telemetry::clear_cache),
        )
        // ── Liveness ────────────────────────────────────────────
        .route("/api/health", get(handlers::telemetry::health))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}

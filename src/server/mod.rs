pub mod routes;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

/// API routes plus the static dashboard bundle as fallback.
pub fn router(state: Arc<AppState>, static_dir: &str) -> Router {
    Router::new()
        .route("/api/dashboard", post(routes::post_dashboard))
        .route("/api/dashboard/latest", get(routes::get_latest))
        .route("/api/adhoc", post(routes::post_adhoc))
        .route("/api/analysis/run", post(routes::post_run_analysis))
        .route("/api/datasets", get(routes::get_datasets))
        .route("/api/counters", get(routes::get_counters))
        .fallback_service(
            ServeDir::new(static_dir).fallback(ServeFile::new(format!("{static_dir}/index.html"))),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

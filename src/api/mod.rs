use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post, put};
use std::sync::{Arc, RwLock};

pub mod handlers;
pub mod responses;

pub fn router(state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route("/api/session", get(handlers::get_session))
        .route("/api/session/start", post(handlers::post_start))
        .route("/api/session/weld", post(handlers::post_weld))
        .route("/api/session/pause", post(handlers::post_pause))
        .route("/api/session/stop", post(handlers::post_stop))
        .route("/api/calibrate", post(handlers::post_calibrate))
        .route("/api/settings", put(handlers::put_settings))
        .route("/api/overlay", get(handlers::get_overlay))
        .route("/api/results", get(handlers::get_results))
        .route("/api/report", get(handlers::get_report))
        .with_state(state)
}

use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::{Arc, RwLock};

pub mod handlers;
pub mod responses;

pub fn router(state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/recommend", post(handlers::post_recommend))
        .route("/api/recommend/compare", post(handlers::post_compare))
        .route("/api/binary", get(handlers::get_binary))
        .route("/api/refresh", get(handlers::get_refresh))
        .route("/api/trends", get(handlers::get_trends))
        .route("/api/forecast", get(handlers::get_forecast))
        .route("/api/test_connection", get(handlers::get_test_connection))
        .route("/api/health", get(handlers::get_health))
        .with_state(state)
}

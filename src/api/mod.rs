use crate::survival::SurvivalEngine;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

pub mod handlers;
pub mod responses;

pub fn router(engine: Arc<SurvivalEngine>) -> Router {
    Router::new()
        .route("/api/vacancy", get(handlers::get_vacancy))
        .route("/api/health", get(handlers::get_health))
        .route("/api/admin/refresh-cache", post(handlers::post_refresh_cache))
        .with_state(engine)
}

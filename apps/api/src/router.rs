use std::sync::Arc;

use axum::{routing::get, Router};

use availability_cell::router::availability_routes;
use booking_cell::router::booking_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/health", get(|| async { "Agenda Clinic API is running!" }))
        .nest("/api/blocks", availability_routes(state.clone()))
        .nest("/api/appointments", booking_routes(state.clone()))
}

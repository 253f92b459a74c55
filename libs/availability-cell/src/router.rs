// libs/availability-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn availability_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/generate", post(handlers::generate_blocks))
        .route("/", get(handlers::list_blocks))
        .route("/bulk-delete", post(handlers::bulk_delete_blocks))
        .route("/slots", get(handlers::get_available_slots))
        .route("/{block_id}/enable", patch(handlers::enable_block))
        .route("/{block_id}/disable", patch(handlers::disable_block))
        .with_state(state)
}

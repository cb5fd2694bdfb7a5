use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use scheduling_cell::router::appointment_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Opal Clinic scheduling API is running!" }))
        .nest("/appointments", appointment_routes(state.clone()))
}

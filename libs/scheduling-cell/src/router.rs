// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/",
            post(handlers::create_appointment)
                .patch(handlers::reschedule_appointment)
                .delete(handlers::cancel_appointment),
        )
        .route("/availability", get(handlers::get_availability))
        .route(
            "/{appointment_id}",
            patch(handlers::reschedule_appointment_by_id)
                .delete(handlers::cancel_appointment_by_id),
        )
        .with_state(state)
}

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_database::AppState;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_email}/schedule", post(handlers::add_slot))
        .route("/{doctor_email}/schedule", get(handlers::list_slots))
        .with_state(state)
}

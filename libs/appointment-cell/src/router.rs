use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_database::AppState;

use crate::handlers;
use crate::AppointmentState;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    appointment_routes_with_state(Arc::new(AppointmentState::new(state)))
}

/// Used by tests that want to reach into the cell's monitor.
pub fn appointment_routes_with_state(state: Arc<AppointmentState>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/cancel", post(handlers::cancel_appointment))
        .route("/patients", get(handlers::list_patients))
        .route("/patients/{patient_email}", get(handlers::get_patient_appointments))
        .route("/reconcile", post(handlers::reconcile))
        .route("/inconsistencies", get(handlers::get_inconsistencies))
        .with_state(state)
}

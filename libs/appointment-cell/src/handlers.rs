// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{AppointmentError, BookAppointmentRequest, CancelAppointmentRequest};
use crate::services::booking::BookingService;
use crate::services::cancellation::CancellationService;
use crate::services::consistency::ReconciliationService;
use crate::services::query::AppointmentQueryService;
use crate::AppointmentState;

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::SlotUnavailable => AppError::Conflict(e.to_string()),
        AppointmentError::AppointmentNotFound => AppError::NotFound(e.to_string()),
        AppointmentError::PatientNotFound => AppError::NotFound(e.to_string()),
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppointmentState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = BookingService::new(
        state.app.users(),
        state.app.appointments(),
        Arc::clone(&state.monitor),
    );

    let record = service
        .book(&request.patient_email, &request.doctor_email, request.slot_id)
        .await
        .map_err(map_appointment_error)?;

    Ok((StatusCode::CREATED, Json(json!({ "appointment": record }))))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = CancellationService::new(
        state.app.users(),
        state.app.appointments(),
        Arc::clone(&state.monitor),
    );

    service
        .cancel(&request.patient_email, &request.doctor_email, request.slot_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "msg": "Appointment cancelled successfully" })))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<AppointmentState>>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentQueryService::new(state.app.users(), state.app.appointments());

    let patients = service
        .list_patient_emails()
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "patients": patients })))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppointmentState>>,
    Path(patient_email): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentQueryService::new(state.app.users(), state.app.appointments());

    let appointments = service
        .list_for_patient(&patient_email)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}

/// Ops endpoint: run one consistency-repair pass over both collections.
#[axum::debug_handler]
pub async fn reconcile(
    State(state): State<Arc<AppointmentState>>,
) -> Result<Json<Value>, AppError> {
    let service = ReconciliationService::new(state.app.users(), state.app.appointments());

    let report = service.reconcile().await.map_err(map_appointment_error)?;

    Ok(Json(json!({ "report": report })))
}

/// Ops endpoint: partial-write inconsistency counters since startup.
#[axum::debug_handler]
pub async fn get_inconsistencies(
    State(state): State<Arc<AppointmentState>>,
) -> Json<Value> {
    Json(json!({ "inconsistencies": state.monitor.snapshot() }))
}

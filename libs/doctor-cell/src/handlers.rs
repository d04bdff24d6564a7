// libs/doctor-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::error::AppError;

use crate::models::{AddSlotRequest, ScheduleError, ScheduleResponse};
use crate::services::schedule::ScheduleService;

fn map_schedule_error(e: ScheduleError) -> AppError {
    match e {
        ScheduleError::DoctorNotFound => AppError::NotFound(e.to_string()),
        ScheduleError::InvalidTimeRange(msg) => AppError::BadRequest(msg),
        ScheduleError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(state.users());
    let doctors = service.list_doctors().await.map_err(map_schedule_error)?;

    Ok(Json(json!({ "doctors": doctors })))
}

#[axum::debug_handler]
pub async fn add_slot(
    State(state): State<Arc<AppState>>,
    Path(doctor_email): Path<String>,
    Json(request): Json<AddSlotRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ScheduleService::new(state.users());
    let slot = service
        .add_slot(&doctor_email, request.day, request.start_time, request.end_time)
        .await
        .map_err(map_schedule_error)?;

    Ok((StatusCode::CREATED, Json(json!({ "slot": slot }))))
}

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<AppState>>,
    Path(doctor_email): Path<String>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let service = ScheduleService::new(state.users());
    let slots = service
        .list_slots(&doctor_email)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(ScheduleResponse {
        doctor_email,
        slots,
    }))
}

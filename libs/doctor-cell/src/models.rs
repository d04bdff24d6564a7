// libs/doctor-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::Slot;

#[derive(Debug, Clone, Deserialize)]
pub struct AddSlotRequest {
    pub day: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResponse {
    pub doctor_email: String,
    pub slots: Vec<Slot>,
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Database error: {0}")]
    Database(String),
}

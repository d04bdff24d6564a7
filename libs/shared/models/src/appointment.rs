// libs/shared/models/src/appointment.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authoritative ledger row: one patient occupying one doctor slot.
///
/// Denormalized on purpose; (day, start_time, end_time) are copied from the
/// slot at booking time so the ledger can be queried without touching the
/// doctor document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentRecord {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub patient_email: String,
    pub doctor_email: String,
    pub day: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

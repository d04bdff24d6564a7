// libs/shared/models/src/user.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account role. Immutable after signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Doctor,
    Patient,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Doctor => write!(f, "doctor"),
            Role::Patient => write!(f, "patient"),
        }
    }
}

/// A doctor-declared unit of bookable time.
///
/// Identity is the generated `id`; (day, start_time, end_time) are display
/// attributes and may legitimately repeat within one schedule. `booked` is
/// toggled only by the booking and cancellation engines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub id: Uuid,
    pub day: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub booked: bool,
}

impl Slot {
    pub fn new(day: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            day,
            start_time,
            end_time,
            booked: false,
        }
    }
}

/// The copy of an appointment embedded in the patient's own document,
/// distinct from the authoritative ledger row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentRef {
    pub slot_id: Uuid,
    pub doctor_email: String,
    pub day: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// A user document. Email is the unique, case-sensitive key.
///
/// Doctors carry an append-only `schedule`; patients carry `appointments`
/// mirroring bookings made for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub schedule: Vec<Slot>,
    #[serde(default)]
    pub appointments: Vec<AppointmentRef>,
}

impl User {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            schedule: Vec::new(),
            appointments: Vec::new(),
        }
    }

    pub fn slot(&self, slot_id: Uuid) -> Option<&Slot> {
        self.schedule.iter().find(|s| s.id == slot_id)
    }
}

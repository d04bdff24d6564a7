// libs/doctor-cell/src/services/schedule.rs
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info};

use shared_database::repository::UserRepository;
use shared_models::{Role, Slot};

use crate::models::ScheduleError;

/// Owns a doctor's slot sequence: appends new slots and reads slot state.
/// Slots are append-only; day and times never change once created, and the
/// `booked` flag belongs to the booking/cancellation engines.
pub struct ScheduleService {
    users: UserRepository,
}

impl ScheduleService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    /// Appends a fresh slot to the doctor's schedule and returns it.
    ///
    /// Duplicate (day, start, end) values are allowed; the generated id is
    /// the slot's identity, so value-identical slots stay distinguishable.
    pub async fn add_slot(
        &self,
        doctor_email: &str,
        day: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<Slot, ScheduleError> {
        debug!("Adding slot for {} on {} {}-{}", doctor_email, day, start_time, end_time);

        if end_time <= start_time {
            return Err(ScheduleError::InvalidTimeRange(format!(
                "end time {} must be after start time {}",
                end_time, start_time
            )));
        }

        let slot = Slot::new(day, start_time, end_time);
        let appended = self
            .users
            .append_slot(doctor_email, &slot)
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        if !appended {
            return Err(ScheduleError::DoctorNotFound);
        }

        info!("Slot {} added for doctor {}", slot.id, doctor_email);
        Ok(slot)
    }

    /// The doctor's schedule as stored, in creation order.
    pub async fn list_slots(&self, doctor_email: &str) -> Result<Vec<Slot>, ScheduleError> {
        let doctor = self
            .users
            .find_with_role(doctor_email, Role::Doctor)
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))?
            .ok_or(ScheduleError::DoctorNotFound)?;

        Ok(doctor.schedule)
    }

    pub async fn list_doctors(&self) -> Result<Vec<String>, ScheduleError> {
        self.users
            .list_doctor_emails()
            .await
            .map_err(|e| ScheduleError::Database(e.to_string()))
    }
}

// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::repository::{AppointmentRepository, UserRepository};
use shared_models::{AppointmentRecord, AppointmentRef, Role, Slot};

use crate::models::{AppointmentError, GuardFailureReason, InconsistencyKind};
use crate::services::monitor::InconsistencyMonitor;

/// The booking engine.
///
/// The slot's `booked` flag is the single source of truth, flipped by one
/// conditional atomic update. The ledger row and the patient's embedded ref
/// are redundant projections written afterwards; their failure is recorded,
/// never propagated, so the guard's outcome alone decides the request.
pub struct BookingService {
    users: UserRepository,
    appointments: AppointmentRepository,
    monitor: Arc<InconsistencyMonitor>,
}

impl BookingService {
    pub fn new(
        users: UserRepository,
        appointments: AppointmentRepository,
        monitor: Arc<InconsistencyMonitor>,
    ) -> Self {
        Self {
            users,
            appointments,
            monitor,
        }
    }

    /// Books the slot for the patient, or fails with `SlotUnavailable`.
    ///
    /// Guarantee: at most one call per slot succeeds until the slot is
    /// cancelled, regardless of concurrency. The guard update is the sole
    /// serialization point; everything after it only adds redundant records.
    pub async fn book(
        &self,
        patient_email: &str,
        doctor_email: &str,
        slot_id: Uuid,
    ) -> Result<AppointmentRecord, AppointmentError> {
        debug!("Booking slot {} with {} for {}", slot_id, doctor_email, patient_email);

        // Pre-read: resolves the slot's display attributes and lets a failed
        // guard be classified for the logs. Never authoritative, so a read
        // failure here must not block the guard.
        let doctor = match self.users.find_with_role(doctor_email, Role::Doctor).await {
            Ok(doctor) => doctor,
            Err(e) => {
                warn!(
                    slot_id = %slot_id,
                    doctor = %doctor_email,
                    "pre-read failed, continuing to the guard: {}",
                    e
                );
                None
            }
        };
        let slot = doctor.as_ref().and_then(|d| d.slot(slot_id)).cloned();

        let outcome = self
            .users
            .reserve_slot(doctor_email, slot_id)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        if !outcome.modified_any() {
            let reason = match (&doctor, &slot) {
                (None, _) => GuardFailureReason::DoctorMissing,
                (Some(_), None) => GuardFailureReason::SlotMissing,
                (Some(_), Some(slot)) if slot.booked => GuardFailureReason::SlotAlreadyBooked,
                _ => GuardFailureReason::LostRace,
            };
            warn!(
                slot_id = %slot_id,
                doctor = %doctor_email,
                "booking rejected: {}",
                reason
            );
            return Err(AppointmentError::SlotUnavailable);
        }

        let slot = self.resolve_slot(doctor_email, slot_id, slot).await?;

        let record = AppointmentRecord {
            id: Uuid::new_v4(),
            slot_id,
            patient_email: patient_email.to_string(),
            doctor_email: doctor_email.to_string(),
            day: slot.day,
            start_time: slot.start_time,
            end_time: slot.end_time,
        };

        // Write (a): the ledger row. The slot stays booked if this fails;
        // the monitor surfaces the orphan for reconciliation.
        if let Err(e) = self.appointments.insert(&record).await {
            self.monitor.record(
                InconsistencyKind::OrphanedBookedSlot,
                slot_id,
                &format!("ledger insert failed after slot was reserved: {}", e),
            );
        }

        // Write (b): the patient's own view. Authoritative state is already
        // correct, so a failure (or an unknown patient) is only recorded.
        match self.users.push_appointment_ref(patient_email, &appointment_ref(&record)).await {
            Ok(true) => {}
            Ok(false) => self.monitor.record(
                InconsistencyKind::MissingPatientRef,
                slot_id,
                &format!("no patient document for {}", patient_email),
            ),
            Err(e) => self.monitor.record(
                InconsistencyKind::MissingPatientRef,
                slot_id,
                &format!("patient ref append failed: {}", e),
            ),
        }

        info!(
            slot_id = %slot_id,
            patient = %patient_email,
            doctor = %doctor_email,
            "appointment booked"
        );
        Ok(record)
    }

    /// The pre-read can miss a slot that was appended between the read and
    /// the guard. The guard matched, so the slot exists; one re-read fetches
    /// its attributes.
    async fn resolve_slot(
        &self,
        doctor_email: &str,
        slot_id: Uuid,
        pre_read: Option<Slot>,
    ) -> Result<Slot, AppointmentError> {
        if let Some(slot) = pre_read {
            return Ok(slot);
        }

        let slot = self
            .users
            .find_with_role(doctor_email, Role::Doctor)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?
            .and_then(|d| d.slot(slot_id).cloned());

        match slot {
            Some(slot) => Ok(slot),
            None => {
                // Reserved but unreadable: the slot stays booked without a
                // ledger row, which reconciliation will release.
                self.monitor.record(
                    InconsistencyKind::OrphanedBookedSlot,
                    slot_id,
                    "reserved slot could not be re-read",
                );
                Err(AppointmentError::Database(
                    "reserved slot could not be re-read".to_string(),
                ))
            }
        }
    }
}

fn appointment_ref(record: &AppointmentRecord) -> AppointmentRef {
    AppointmentRef {
        slot_id: record.slot_id,
        doctor_email: record.doctor_email.clone(),
        day: record.day,
        start_time: record.start_time,
        end_time: record.end_time,
    }
}

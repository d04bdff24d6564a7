// libs/appointment-cell/src/services/cancellation.rs
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::repository::{AppointmentRepository, UserRepository};
use shared_models::Role;

use crate::models::{AppointmentError, GuardFailureReason, InconsistencyKind};
use crate::services::monitor::InconsistencyMonitor;

/// The cancellation engine: the exact inverse of booking.
///
/// The guard frees the slot atomically; removing the patient ref and the
/// ledger row are best-effort follow-ups whose failure leaves stale
/// redundant records behind, recorded for reconciliation rather than
/// returned to the caller.
pub struct CancellationService {
    users: UserRepository,
    appointments: AppointmentRepository,
    monitor: Arc<InconsistencyMonitor>,
}

impl CancellationService {
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

    /// Frees the slot and removes both redundant records. After success the
    /// identical slot is bookable again.
    pub async fn cancel(
        &self,
        patient_email: &str,
        doctor_email: &str,
        slot_id: Uuid,
    ) -> Result<(), AppointmentError> {
        debug!("Cancelling slot {} with {} for {}", slot_id, doctor_email, patient_email);

        // Diagnostic pre-read only; a read failure must not block the guard.
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

        let outcome = self
            .users
            .release_slot(doctor_email, slot_id)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        if !outcome.modified_any() {
            let slot = doctor.as_ref().and_then(|d| d.slot(slot_id));
            let reason = match (&doctor, slot) {
                (None, _) => GuardFailureReason::DoctorMissing,
                (Some(_), None) => GuardFailureReason::SlotMissing,
                (Some(_), Some(slot)) if !slot.booked => GuardFailureReason::SlotNotBooked,
                _ => GuardFailureReason::LostRace,
            };
            warn!(
                slot_id = %slot_id,
                doctor = %doctor_email,
                "cancellation rejected: {}",
                reason
            );
            return Err(AppointmentError::AppointmentNotFound);
        }

        match self.users.pull_appointment_ref(patient_email, slot_id).await {
            Ok(true) => {}
            Ok(false) => debug!(
                slot_id = %slot_id,
                "no patient ref to remove for {}",
                patient_email
            ),
            Err(e) => self.monitor.record(
                InconsistencyKind::StalePatientRef,
                slot_id,
                &format!("patient ref removal failed: {}", e),
            ),
        }

        match self.appointments.delete(patient_email, slot_id).await {
            Ok(true) => {}
            Ok(false) => debug!(slot_id = %slot_id, "no ledger row to delete"),
            Err(e) => self.monitor.record(
                InconsistencyKind::StaleLedgerRow,
                slot_id,
                &format!("ledger delete failed: {}", e),
            ),
        }

        info!(
            slot_id = %slot_id,
            patient = %patient_email,
            doctor = %doctor_email,
            "appointment cancelled"
        );
        Ok(())
    }
}

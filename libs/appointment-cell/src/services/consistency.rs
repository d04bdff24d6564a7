// libs/appointment-cell/src/services/consistency.rs
//
// The consistency-repair pass. The slot's booked flag is authoritative;
// ledger rows and patient refs are derived projections that this service
// rebuilds or discards whenever the engines' secondary writes were cut
// short. Runs out of band (ops endpoint or scheduler), never in the request
// path.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};
use uuid::Uuid;

use shared_database::repository::{AppointmentRepository, UserRepository};
use shared_models::{AppointmentRecord, AppointmentRef, Role, User};

use crate::models::{AppointmentError, ReconciliationReport};

pub struct ReconciliationService {
    users: UserRepository,
    appointments: AppointmentRepository,
}

impl ReconciliationService {
    pub fn new(users: UserRepository, appointments: AppointmentRepository) -> Self {
        Self { users, appointments }
    }

    /// Scans both collections and repairs every disagreement it finds.
    ///
    /// Slot state against the ledger first, then patient refs against the
    /// surviving ledger rows:
    /// - booked slot, no ledger row: release the slot (the patient is
    ///   unknowable, so the half-finished booking is undone);
    /// - ledger row, slot absent or free: delete the row and pull the ref
    ///   (completes a half-finished cancellation);
    /// - surviving row, ref missing: push the ref back;
    /// - ref with no surviving row: pull it.
    pub async fn reconcile(&self) -> Result<ReconciliationReport, AppointmentError> {
        let mut report = ReconciliationReport::default();

        let doctors = self.list_users(Role::Doctor).await?;
        let ledger = self
            .appointments
            .list_all()
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let ledger_by_slot: HashMap<Uuid, &AppointmentRecord> =
            ledger.iter().map(|record| (record.slot_id, record)).collect();

        // Booked slots nothing in the ledger knows about.
        for doctor in &doctors {
            for slot in &doctor.schedule {
                if slot.booked && !ledger_by_slot.contains_key(&slot.id) {
                    let outcome = self
                        .users
                        .release_slot(&doctor.email, slot.id)
                        .await
                        .map_err(|e| AppointmentError::Database(e.to_string()))?;
                    if outcome.modified_any() {
                        warn!(slot_id = %slot.id, doctor = %doctor.email, "released orphaned booked slot");
                        report.released_slots += 1;
                    }
                }
            }
        }

        // Ledger rows whose slot no longer backs them.
        let mut removed_rows: HashSet<Uuid> = HashSet::new();
        for record in &ledger {
            let slot = doctors
                .iter()
                .find(|d| d.email == record.doctor_email)
                .and_then(|d| d.slot(record.slot_id));
            if slot.is_some_and(|s| s.booked) {
                continue;
            }

            let deleted = self
                .appointments
                .delete_by_id(record.id)
                .await
                .map_err(|e| AppointmentError::Database(e.to_string()))?;
            if deleted {
                warn!(slot_id = %record.slot_id, patient = %record.patient_email, "removed stale ledger row");
                report.removed_ledger_rows += 1;
            }
            self.users
                .pull_appointment_ref(&record.patient_email, record.slot_id)
                .await
                .map_err(|e| AppointmentError::Database(e.to_string()))?;
            removed_rows.insert(record.id);
        }

        // Patient refs against the rows that survived.
        let patients = self.list_users(Role::Patient).await?;
        let surviving: Vec<&AppointmentRecord> = ledger
            .iter()
            .filter(|record| !removed_rows.contains(&record.id))
            .collect();

        for record in &surviving {
            let Some(patient) = patients.iter().find(|p| p.email == record.patient_email) else {
                warn!(
                    slot_id = %record.slot_id,
                    "ledger row references unknown patient {}",
                    record.patient_email
                );
                continue;
            };
            if patient.appointments.iter().any(|a| a.slot_id == record.slot_id) {
                continue;
            }

            let restored = self
                .users
                .push_appointment_ref(&record.patient_email, &ref_from_record(record))
                .await
                .map_err(|e| AppointmentError::Database(e.to_string()))?;
            if restored {
                warn!(slot_id = %record.slot_id, patient = %record.patient_email, "restored missing patient ref");
                report.restored_patient_refs += 1;
            }
        }

        let surviving_pairs: HashSet<(&str, Uuid)> = surviving
            .iter()
            .map(|record| (record.patient_email.as_str(), record.slot_id))
            .collect();
        for patient in &patients {
            for appointment in &patient.appointments {
                if surviving_pairs.contains(&(patient.email.as_str(), appointment.slot_id)) {
                    continue;
                }
                let pulled = self
                    .users
                    .pull_appointment_ref(&patient.email, appointment.slot_id)
                    .await
                    .map_err(|e| AppointmentError::Database(e.to_string()))?;
                if pulled {
                    warn!(slot_id = %appointment.slot_id, patient = %patient.email, "removed dangling patient ref");
                    report.removed_patient_refs += 1;
                }
            }
        }

        info!(repairs = report.total_repairs(), "reconciliation pass finished");
        Ok(report)
    }

    async fn list_users(&self, role: Role) -> Result<Vec<User>, AppointmentError> {
        self.users
            .list_with_role(role)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))
    }
}

fn ref_from_record(record: &AppointmentRecord) -> AppointmentRef {
    AppointmentRef {
        slot_id: record.slot_id,
        doctor_email: record.doctor_email.clone(),
        day: record.day,
        start_time: record.start_time,
        end_time: record.end_time,
    }
}

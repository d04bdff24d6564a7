// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_email: String,
    pub doctor_email: String,
    pub slot_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelAppointmentRequest {
    pub patient_email: String,
    pub doctor_email: String,
    pub slot_id: Uuid,
}

/// Caller-visible error taxonomy. `SlotUnavailable` and
/// `AppointmentNotFound` deliberately merge several root causes (missing
/// doctor, missing slot, wrong booked state); the distinguished reason only
/// reaches the logs.
#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Slot not available")]
    SlotUnavailable,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Database error: {0}")]
    Database(String),
}

/// Internal classification of a failed guard update, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardFailureReason {
    DoctorMissing,
    SlotMissing,
    SlotAlreadyBooked,
    SlotNotBooked,
    /// The pre-read and the guard disagreed; another request changed the
    /// slot state in between.
    LostRace,
}

impl fmt::Display for GuardFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardFailureReason::DoctorMissing => write!(f, "doctor does not exist"),
            GuardFailureReason::SlotMissing => write!(f, "slot does not exist"),
            GuardFailureReason::SlotAlreadyBooked => write!(f, "slot already booked"),
            GuardFailureReason::SlotNotBooked => write!(f, "slot is not booked"),
            GuardFailureReason::LostRace => write!(f, "slot state changed concurrently"),
        }
    }
}

/// A secondary write that failed (or found nothing to write) after the
/// atomic guard already committed, leaving redundant records out of step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InconsistencyKind {
    /// Slot marked booked but the ledger insert failed.
    OrphanedBookedSlot,
    /// Ledger row exists but the patient document is missing the ref.
    MissingPatientRef,
    /// Slot freed but the patient still carries the ref.
    StalePatientRef,
    /// Slot freed but the ledger row could not be deleted.
    StaleLedgerRow,
}

impl fmt::Display for InconsistencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InconsistencyKind::OrphanedBookedSlot => write!(f, "orphaned_booked_slot"),
            InconsistencyKind::MissingPatientRef => write!(f, "missing_patient_ref"),
            InconsistencyKind::StalePatientRef => write!(f, "stale_patient_ref"),
            InconsistencyKind::StaleLedgerRow => write!(f, "stale_ledger_row"),
        }
    }
}

/// Counters the inconsistency monitor exposes to operators.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct InconsistencySnapshot {
    pub orphaned_booked_slots: u64,
    pub missing_patient_refs: u64,
    pub stale_patient_refs: u64,
    pub stale_ledger_rows: u64,
}

impl InconsistencySnapshot {
    pub fn total(&self) -> u64 {
        self.orphaned_booked_slots
            + self.missing_patient_refs
            + self.stale_patient_refs
            + self.stale_ledger_rows
    }
}

/// What one reconciliation pass repaired.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Booked slots with no ledger row, released.
    pub released_slots: u64,
    /// Ledger rows whose slot was absent or free, deleted.
    pub removed_ledger_rows: u64,
    /// Patient refs restored from surviving ledger rows.
    pub restored_patient_refs: u64,
    /// Patient refs with no backing ledger row, removed.
    pub removed_patient_refs: u64,
}

impl ReconciliationReport {
    pub fn total_repairs(&self) -> u64 {
        self.released_slots
            + self.removed_ledger_rows
            + self.restored_patient_refs
            + self.removed_patient_refs
    }
}

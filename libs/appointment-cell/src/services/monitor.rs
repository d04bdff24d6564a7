// libs/appointment-cell/src/services/monitor.rs
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;
use uuid::Uuid;

use crate::models::{InconsistencyKind, InconsistencySnapshot};

/// Records partial-write inconsistencies left behind when a secondary write
/// fails after the atomic guard has already committed.
///
/// These are never surfaced as request failures; they are counted and
/// warn-logged so an operator (or the reconciliation pass) can repair the
/// redundant records later.
#[derive(Default)]
pub struct InconsistencyMonitor {
    orphaned_booked_slots: AtomicU64,
    missing_patient_refs: AtomicU64,
    stale_patient_refs: AtomicU64,
    stale_ledger_rows: AtomicU64,
}

impl InconsistencyMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: InconsistencyKind, slot_id: Uuid, detail: &str) {
        let counter = match kind {
            InconsistencyKind::OrphanedBookedSlot => &self.orphaned_booked_slots,
            InconsistencyKind::MissingPatientRef => &self.missing_patient_refs,
            InconsistencyKind::StalePatientRef => &self.stale_patient_refs,
            InconsistencyKind::StaleLedgerRow => &self.stale_ledger_rows,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        warn!(
            kind = %kind,
            slot_id = %slot_id,
            "partial write inconsistency: {}",
            detail
        );
    }

    pub fn snapshot(&self) -> InconsistencySnapshot {
        InconsistencySnapshot {
            orphaned_booked_slots: self.orphaned_booked_slots.load(Ordering::Relaxed),
            missing_patient_refs: self.missing_patient_refs.load(Ordering::Relaxed),
            stale_patient_refs: self.stale_patient_refs.load(Ordering::Relaxed),
            stale_ledger_rows: self.stale_ledger_rows.load(Ordering::Relaxed),
        }
    }
}

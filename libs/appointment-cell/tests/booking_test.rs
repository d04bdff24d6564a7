use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use appointment_cell::models::AppointmentError;
use appointment_cell::services::booking::BookingService;
use appointment_cell::services::cancellation::CancellationService;
use appointment_cell::services::monitor::InconsistencyMonitor;
use appointment_cell::services::query::AppointmentQueryService;
use shared_database::memory::MemoryStore;
use shared_database::repository::{AppointmentRepository, UserRepository};
use shared_models::{Role, Slot, User};

const DOCTOR: &str = "doc1@clinic.test";
const PATIENT: &str = "pat1@clinic.test";
const OTHER_PATIENT: &str = "pat2@clinic.test";

struct Harness {
    users: UserRepository,
    appointments: AppointmentRepository,
    monitor: Arc<InconsistencyMonitor>,
}

impl Harness {
    async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let users = UserRepository::new(store.clone());
        let appointments = AppointmentRepository::new(store);

        for (email, role) in [
            (DOCTOR, Role::Doctor),
            (PATIENT, Role::Patient),
            (OTHER_PATIENT, Role::Patient),
        ] {
            users.insert(&User::new(email, "hash", role)).await.unwrap();
        }

        Self {
            users,
            appointments,
            monitor: Arc::new(InconsistencyMonitor::new()),
        }
    }

    fn booking(&self) -> BookingService {
        BookingService::new(
            self.users.clone(),
            self.appointments.clone(),
            Arc::clone(&self.monitor),
        )
    }

    fn cancellation(&self) -> CancellationService {
        CancellationService::new(
            self.users.clone(),
            self.appointments.clone(),
            Arc::clone(&self.monitor),
        )
    }

    fn queries(&self) -> AppointmentQueryService {
        AppointmentQueryService::new(self.users.clone(), self.appointments.clone())
    }

    async fn add_slot(&self) -> Slot {
        let slot = Slot::new(
            NaiveDate::from_ymd_opt(2026, 9, 7).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        );
        assert!(self.users.append_slot(DOCTOR, &slot).await.unwrap());
        slot
    }

    async fn slot_is_booked(&self, slot_id: Uuid) -> bool {
        self.users
            .find_with_role(DOCTOR, Role::Doctor)
            .await
            .unwrap()
            .unwrap()
            .slot(slot_id)
            .unwrap()
            .booked
    }
}

#[tokio::test]
async fn booking_a_never_added_slot_is_unavailable() {
    let h = Harness::new().await;

    let err = h.booking().book(PATIENT, DOCTOR, Uuid::new_v4()).await.unwrap_err();
    assert_matches!(err, AppointmentError::SlotUnavailable);
}

#[tokio::test]
async fn booking_an_unknown_doctor_is_unavailable() {
    let h = Harness::new().await;

    let err = h
        .booking()
        .book(PATIENT, "ghost@clinic.test", Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(err, AppointmentError::SlotUnavailable);
}

#[tokio::test]
async fn booking_updates_slot_ledger_and_patient_view() {
    let h = Harness::new().await;
    let slot = h.add_slot().await;

    let record = h.booking().book(PATIENT, DOCTOR, slot.id).await.unwrap();
    assert_eq!(record.slot_id, slot.id);
    assert_eq!(record.day, slot.day);

    assert!(h.slot_is_booked(slot.id).await);

    let appointments = h.queries().list_for_patient(PATIENT).await.unwrap();
    assert_eq!(appointments, vec![record]);

    let patient = h
        .users
        .find_with_role(PATIENT, Role::Patient)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(patient.appointments.len(), 1);
    assert_eq!(patient.appointments[0].slot_id, slot.id);

    assert_eq!(h.monitor.snapshot().total(), 0);
}

#[tokio::test]
async fn a_booked_slot_cannot_be_booked_again() {
    let h = Harness::new().await;
    let slot = h.add_slot().await;

    h.booking().book(PATIENT, DOCTOR, slot.id).await.unwrap();

    let err = h
        .booking()
        .book(OTHER_PATIENT, DOCTOR, slot.id)
        .await
        .unwrap_err();
    assert_matches!(err, AppointmentError::SlotUnavailable);

    // The loser left no trace in the ledger or the patient document.
    assert!(h.queries().list_for_patient(OTHER_PATIENT).await.unwrap().is_empty());
}

#[tokio::test]
async fn cancel_frees_the_slot_and_clears_both_records() {
    let h = Harness::new().await;
    let slot = h.add_slot().await;

    h.booking().book(PATIENT, DOCTOR, slot.id).await.unwrap();
    h.cancellation().cancel(PATIENT, DOCTOR, slot.id).await.unwrap();

    assert!(!h.slot_is_booked(slot.id).await);
    assert!(h.queries().list_for_patient(PATIENT).await.unwrap().is_empty());

    let patient = h
        .users
        .find_with_role(PATIENT, Role::Patient)
        .await
        .unwrap()
        .unwrap();
    assert!(patient.appointments.is_empty());
}

#[tokio::test]
async fn cancel_on_a_never_booked_slot_fails() {
    let h = Harness::new().await;
    let slot = h.add_slot().await;

    let err = h
        .cancellation()
        .cancel(PATIENT, DOCTOR, slot.id)
        .await
        .unwrap_err();
    assert_matches!(err, AppointmentError::AppointmentNotFound);

    let err = h
        .cancellation()
        .cancel(PATIENT, DOCTOR, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(err, AppointmentError::AppointmentNotFound);
}

#[tokio::test]
async fn book_cancel_book_round_trip() {
    let h = Harness::new().await;
    let slot = h.add_slot().await;

    h.booking().book(PATIENT, DOCTOR, slot.id).await.unwrap();

    let err = h
        .booking()
        .book(OTHER_PATIENT, DOCTOR, slot.id)
        .await
        .unwrap_err();
    assert_matches!(err, AppointmentError::SlotUnavailable);

    h.cancellation().cancel(PATIENT, DOCTOR, slot.id).await.unwrap();

    let record = h
        .booking()
        .book(OTHER_PATIENT, DOCTOR, slot.id)
        .await
        .unwrap();
    assert_eq!(record.patient_email, OTHER_PATIENT);
    assert!(h.slot_is_booked(slot.id).await);

    let appointments = h.queries().list_for_patient(OTHER_PATIENT).await.unwrap();
    assert_eq!(appointments.len(), 1);
}

#[tokio::test]
async fn retrying_a_cancel_is_safe() {
    let h = Harness::new().await;
    let slot = h.add_slot().await;

    h.booking().book(PATIENT, DOCTOR, slot.id).await.unwrap();
    h.cancellation().cancel(PATIENT, DOCTOR, slot.id).await.unwrap();

    let err = h
        .cancellation()
        .cancel(PATIENT, DOCTOR, slot.id)
        .await
        .unwrap_err();
    assert_matches!(err, AppointmentError::AppointmentNotFound);

    assert!(!h.slot_is_booked(slot.id).await);
}

#[tokio::test]
async fn listing_appointments_for_an_unknown_patient_fails() {
    let h = Harness::new().await;

    let err = h
        .queries()
        .list_for_patient("ghost@clinic.test")
        .await
        .unwrap_err();
    assert_matches!(err, AppointmentError::PatientNotFound);

    let err = h.queries().list_for_patient(DOCTOR).await.unwrap_err();
    assert_matches!(err, AppointmentError::PatientNotFound);
}

#[tokio::test]
async fn patient_roster_excludes_doctors() {
    let h = Harness::new().await;

    let patients = h.queries().list_patient_emails().await.unwrap();
    assert_eq!(patients, vec![PATIENT, OTHER_PATIENT]);
}

#[tokio::test]
async fn booking_for_an_unknown_patient_still_succeeds_but_is_recorded() {
    let h = Harness::new().await;
    let slot = h.add_slot().await;

    let record = h
        .booking()
        .book("ghost@clinic.test", DOCTOR, slot.id)
        .await
        .unwrap();

    // Authoritative state is correct: slot booked, ledger row present.
    assert!(h.slot_is_booked(slot.id).await);
    assert!(h.appointments.find_by_slot(slot.id).await.unwrap().is_some());
    assert_eq!(record.patient_email, "ghost@clinic.test");

    // The missing patient view is an operational signal, not a failure.
    assert_eq!(h.monitor.snapshot().missing_patient_refs, 1);
}

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use futures::future::join_all;

use appointment_cell::models::AppointmentError;
use appointment_cell::services::booking::BookingService;
use appointment_cell::services::cancellation::CancellationService;
use appointment_cell::services::monitor::InconsistencyMonitor;
use shared_database::memory::MemoryStore;
use shared_database::repository::{AppointmentRepository, UserRepository};
use shared_models::{Role, Slot, User};

const DOCTOR: &str = "doc@clinic.test";

async fn seeded(patients: usize) -> (UserRepository, AppointmentRepository, Slot) {
    let store = Arc::new(MemoryStore::new());
    let users = UserRepository::new(store.clone());
    let appointments = AppointmentRepository::new(store);

    users.insert(&User::new(DOCTOR, "hash", Role::Doctor)).await.unwrap();
    for i in 0..patients {
        users
            .insert(&User::new(format!("pat{}@clinic.test", i), "hash", Role::Patient))
            .await
            .unwrap();
    }

    let slot = Slot::new(
        NaiveDate::from_ymd_opt(2026, 9, 7).unwrap(),
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
    );
    users.append_slot(DOCTOR, &slot).await.unwrap();

    (users, appointments, slot)
}

#[tokio::test]
async fn exactly_one_of_n_concurrent_bookings_wins() {
    const ATTEMPTS: usize = 16;

    let (users, appointments, slot) = seeded(ATTEMPTS).await;
    let monitor = Arc::new(InconsistencyMonitor::new());

    let tasks = (0..ATTEMPTS).map(|i| {
        let service = BookingService::new(
            users.clone(),
            appointments.clone(),
            Arc::clone(&monitor),
        );
        let slot_id = slot.id;
        tokio::spawn(async move {
            service
                .book(&format!("pat{}@clinic.test", i), DOCTOR, slot_id)
                .await
        })
    });

    let results: Vec<_> = join_all(tasks).await.into_iter().map(Result::unwrap).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one concurrent booking must succeed");

    for result in &results {
        if let Err(e) = result {
            assert!(matches!(e, AppointmentError::SlotUnavailable));
        }
    }

    // One ledger row, written by the winner.
    let winner = results.into_iter().find_map(Result::ok).unwrap();
    let ledger = appointments.list_all().await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].patient_email, winner.patient_email);

    assert_eq!(monitor.snapshot().total(), 0);
}

#[tokio::test]
async fn concurrent_cancels_release_the_slot_once() {
    const ATTEMPTS: usize = 8;

    let (users, appointments, slot) = seeded(ATTEMPTS).await;
    let monitor = Arc::new(InconsistencyMonitor::new());

    BookingService::new(users.clone(), appointments.clone(), Arc::clone(&monitor))
        .book("pat0@clinic.test", DOCTOR, slot.id)
        .await
        .unwrap();

    let tasks = (0..ATTEMPTS).map(|_| {
        let service = CancellationService::new(
            users.clone(),
            appointments.clone(),
            Arc::clone(&monitor),
        );
        let slot_id = slot.id;
        tokio::spawn(async move { service.cancel("pat0@clinic.test", DOCTOR, slot_id).await })
    });

    let results: Vec<_> = join_all(tasks).await.into_iter().map(Result::unwrap).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one concurrent cancel must succeed");

    assert!(appointments.list_all().await.unwrap().is_empty());
}

// libs/shared/database/src/repository.rs
//
// Typed access to the two collections. The repositories own document
// addressing (filters, updates, (de)serialization); the consistency
// invariant across collections stays with the booking and cancellation
// engines.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::{AppointmentRecord, AppointmentRef, Role, Slot, User};

use crate::store::{DocumentStore, UpdateOutcome};

pub const USERS: &str = "users";
pub const APPOINTMENTS: &str = "appointments";

#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn insert(&self, user: &User) -> Result<()> {
        let document = serde_json::to_value(user)?;
        self.store.insert_one(USERS, document).await?;
        Ok(())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let doc = self.store.find_one(USERS, json!({ "email": email })).await?;
        doc.map(parse_user).transpose()
    }

    pub async fn find_with_role(&self, email: &str, role: Role) -> Result<Option<User>> {
        let doc = self
            .store
            .find_one(USERS, json!({ "email": email, "role": role }))
            .await?;
        doc.map(parse_user).transpose()
    }

    /// Doctor roster, emails only (projection scan).
    pub async fn list_doctor_emails(&self) -> Result<Vec<String>> {
        self.list_emails_with_role(Role::Doctor).await
    }

    /// Patient roster, emails only.
    pub async fn list_patient_emails(&self) -> Result<Vec<String>> {
        self.list_emails_with_role(Role::Patient).await
    }

    async fn list_emails_with_role(&self, role: Role) -> Result<Vec<String>> {
        let docs = self
            .store
            .find_many(USERS, json!({ "role": role }), Some(json!({ "email": 1 })))
            .await?;
        Ok(docs
            .iter()
            .filter_map(|doc| doc.get("email").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// Full documents for one role, used by the reconciliation pass.
    pub async fn list_with_role(&self, role: Role) -> Result<Vec<User>> {
        let docs = self
            .store
            .find_many(USERS, json!({ "role": role }), None)
            .await?;
        docs.into_iter().map(parse_user).collect()
    }

    /// Appends a slot to a doctor's schedule. Returns false when no user
    /// with that email and the doctor role exists.
    pub async fn append_slot(&self, doctor_email: &str, slot: &Slot) -> Result<bool> {
        let outcome = self
            .store
            .update_one(
                USERS,
                json!({ "email": doctor_email, "role": Role::Doctor }),
                json!({ "$push": { "schedule": slot } }),
            )
            .await?;
        Ok(outcome.matched > 0)
    }

    /// The booking guard: flips the slot to booked iff it is currently free.
    /// One store-level conditional update; of N concurrent calls for the
    /// same slot exactly one sees `modified == 1`.
    pub async fn reserve_slot(&self, doctor_email: &str, slot_id: Uuid) -> Result<UpdateOutcome> {
        self.flip_slot(doctor_email, slot_id, false, true).await
    }

    /// The cancellation guard: frees the slot iff it is currently booked.
    pub async fn release_slot(&self, doctor_email: &str, slot_id: Uuid) -> Result<UpdateOutcome> {
        self.flip_slot(doctor_email, slot_id, true, false).await
    }

    async fn flip_slot(
        &self,
        doctor_email: &str,
        slot_id: Uuid,
        from: bool,
        to: bool,
    ) -> Result<UpdateOutcome> {
        self.store
            .update_one(
                USERS,
                json!({
                    "email": doctor_email,
                    "role": Role::Doctor,
                    "schedule": { "$elemMatch": { "id": slot_id, "booked": from } }
                }),
                json!({ "$set": { "schedule.$.booked": to } }),
            )
            .await
    }

    /// Mirrors a booking onto the patient document. Returns false when no
    /// patient with that email exists.
    pub async fn push_appointment_ref(
        &self,
        patient_email: &str,
        appointment: &AppointmentRef,
    ) -> Result<bool> {
        let outcome = self
            .store
            .update_one(
                USERS,
                json!({ "email": patient_email, "role": Role::Patient }),
                json!({ "$push": { "appointments": appointment } }),
            )
            .await?;
        Ok(outcome.matched > 0)
    }

    /// Removes the mirrored ref. Returns false when nothing was removed.
    pub async fn pull_appointment_ref(&self, patient_email: &str, slot_id: Uuid) -> Result<bool> {
        let outcome = self
            .store
            .update_one(
                USERS,
                json!({ "email": patient_email, "role": Role::Patient }),
                json!({ "$pull": { "appointments": { "slot_id": slot_id } } }),
            )
            .await?;
        Ok(outcome.modified_any())
    }
}

#[derive(Clone)]
pub struct AppointmentRepository {
    store: Arc<dyn DocumentStore>,
}

impl AppointmentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn insert(&self, record: &AppointmentRecord) -> Result<()> {
        let document = serde_json::to_value(record)?;
        self.store.insert_one(APPOINTMENTS, document).await?;
        Ok(())
    }

    pub async fn find_by_patient(&self, patient_email: &str) -> Result<Vec<AppointmentRecord>> {
        let docs = self
            .store
            .find_many(APPOINTMENTS, json!({ "patient_email": patient_email }), None)
            .await?;
        docs.into_iter().map(parse_record).collect()
    }

    pub async fn find_by_slot(&self, slot_id: Uuid) -> Result<Option<AppointmentRecord>> {
        let doc = self
            .store
            .find_one(APPOINTMENTS, json!({ "slot_id": slot_id }))
            .await?;
        doc.map(parse_record).transpose()
    }

    pub async fn list_all(&self) -> Result<Vec<AppointmentRecord>> {
        let docs = self.store.find_many(APPOINTMENTS, json!({}), None).await?;
        docs.into_iter().map(parse_record).collect()
    }

    /// Deletes the ledger row for one (patient, slot) pair. Returns false
    /// when no row matched.
    pub async fn delete(&self, patient_email: &str, slot_id: Uuid) -> Result<bool> {
        let outcome = self
            .store
            .delete_one(
                APPOINTMENTS,
                json!({ "patient_email": patient_email, "slot_id": slot_id }),
            )
            .await?;
        Ok(outcome.deleted > 0)
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
        let outcome = self.store.delete_one(APPOINTMENTS, json!({ "id": id })).await?;
        Ok(outcome.deleted > 0)
    }
}

fn parse_user(doc: Value) -> Result<User> {
    serde_json::from_value(doc).context("failed to parse user document")
}

fn parse_record(doc: Value) -> Result<AppointmentRecord> {
    serde_json::from_value(doc).context("failed to parse appointment record")
}

// libs/appointment-cell/src/services/query.rs
use shared_database::repository::{AppointmentRepository, UserRepository};
use shared_models::{AppointmentRecord, Role};

use crate::models::AppointmentError;

/// Read-only views over the ledger. No consistency concerns: results
/// reflect whatever the store holds, including any partial inconsistency
/// the engines have recorded but not yet repaired.
pub struct AppointmentQueryService {
    users: UserRepository,
    appointments: AppointmentRepository,
}

impl AppointmentQueryService {
    pub fn new(users: UserRepository, appointments: AppointmentRepository) -> Self {
        Self { users, appointments }
    }

    /// Patient roster, emails only; the counterpart of the doctor roster.
    pub async fn list_patient_emails(&self) -> Result<Vec<String>, AppointmentError> {
        self.users
            .list_patient_emails()
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))
    }

    pub async fn list_for_patient(
        &self,
        patient_email: &str,
    ) -> Result<Vec<AppointmentRecord>, AppointmentError> {
        self.users
            .find_with_role(patient_email, Role::Patient)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?
            .ok_or(AppointmentError::PatientNotFound)?;

        self.appointments
            .find_by_patient(patient_email)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))
    }
}

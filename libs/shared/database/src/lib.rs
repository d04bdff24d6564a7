pub mod data_api;
pub mod memory;
pub mod repository;
pub mod store;

use std::sync::Arc;

use shared_config::AppConfig;

use crate::data_api::DataApiClient;
use crate::repository::{AppointmentRepository, UserRepository};
use crate::store::DocumentStore;

/// Shared handler state: configuration plus the document store collaborator.
///
/// The store is held behind a trait object so tests can swap in
/// [`memory::MemoryStore`] without touching any handler or service code.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = Arc::new(DataApiClient::new(&config));
        Self { config, store }
    }

    pub fn with_store(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self { config, store }
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(Arc::clone(&self.store))
    }

    pub fn appointments(&self) -> AppointmentRepository {
        AppointmentRepository::new(Arc::clone(&self.store))
    }
}

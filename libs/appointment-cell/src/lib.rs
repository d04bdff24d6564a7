pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::*;

use std::sync::Arc;

use shared_database::AppState;

use crate::services::monitor::InconsistencyMonitor;

/// Router state for the appointment cell: the shared app state plus the
/// cell's long-lived inconsistency monitor. Services are constructed per
/// request, so the counters live here.
#[derive(Clone)]
pub struct AppointmentState {
    pub app: Arc<AppState>,
    pub monitor: Arc<InconsistencyMonitor>,
}

impl AppointmentState {
    pub fn new(app: Arc<AppState>) -> Self {
        Self {
            app,
            monitor: Arc::new(InconsistencyMonitor::new()),
        }
    }
}

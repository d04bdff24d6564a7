pub mod booking;
pub mod cancellation;
pub mod consistency;
pub mod monitor;
pub mod query;

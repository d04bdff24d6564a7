pub mod appointment;
pub mod error;
pub mod user;

pub use appointment::*;
pub use error::*;
pub use user::*;

// libs/auth-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::Role;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_doctor: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub email: String,
    pub role: Role,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("A user with this email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    Database(String),
}

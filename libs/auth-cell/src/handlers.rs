// libs/auth-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::error::AppError;
use shared_models::Role;

use crate::models::{AuthError, LoginRequest, LoginResponse, SignupRequest};
use crate::services::account::AccountService;

fn map_auth_error(e: AuthError) -> AppError {
    match e {
        AuthError::EmailTaken => AppError::Conflict(e.to_string()),
        AuthError::InvalidCredentials => AppError::Unauthorized(e.to_string()),
        AuthError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let role = if request.is_doctor { Role::Doctor } else { Role::Patient };

    let service = AccountService::new(state.users());
    service
        .signup(&request.email, &request.password, role)
        .await
        .map_err(map_auth_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "User registered successfully", "role": role })),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let service = AccountService::new(state.users());
    let role = service
        .login(&request.email, &request.password)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(LoginResponse {
        email: request.email,
        role,
    }))
}

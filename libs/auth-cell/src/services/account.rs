// libs/auth-cell/src/services/account.rs
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::{debug, info};

use shared_database::repository::UserRepository;
use shared_models::{Role, User};

use crate::models::AuthError;

pub struct AccountService {
    users: UserRepository,
}

impl AccountService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    /// Registers a new account. Email is the unique key; role is fixed at
    /// signup and never changes afterwards.
    pub async fn signup(&self, email: &str, password: &str, role: Role) -> Result<(), AuthError> {
        debug!("Signing up {} as {}", email, role);

        let existing = self
            .users
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;
        if existing.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(password)
            .map_err(|e| AuthError::Database(format!("password hashing failed: {}", e)))?;

        let user = User::new(email, password_hash, role);
        self.users
            .insert(&user)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        info!("User {} registered as {}", email, role);
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Role, AuthError> {
        debug!("Login attempt for {}", email);

        let user = self
            .users
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Database(format!("password verification failed: {}", e)))?
        {
            Ok(user.role)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

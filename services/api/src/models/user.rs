//! User model and password handling

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::{validate_email, validate_username};

/// Errors raised while hashing a password
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password must not be empty")]
    Empty,

    #[error("Failed to hash password: {0}")]
    Hash(String),
}

/// Hash a plaintext password with Argon2 and a fresh salt
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    if plain.is_empty() {
        return Err(PasswordError::Empty);
    }

    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// User entity
///
/// An `id` of zero marks a user that has not been persisted yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub bio: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Build an unsaved user with a hashed password
    pub fn new(username: &str, email: &str, password: &str) -> Result<Self, PasswordError> {
        let mut user = Self {
            username: username.to_string(),
            email: email.to_string(),
            ..Self::default()
        };
        user.set_password(password)?;
        Ok(user)
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// Replace the stored hash. The previous hash is kept on failure.
    pub fn set_password(&mut self, plain: &str) -> Result<(), PasswordError> {
        self.password_hash = hash_password(plain)?;
        Ok(())
    }

    /// Verify a plaintext password against the stored hash
    pub fn check_password(&self, plain: &str) -> bool {
        if plain.is_empty() || self.password_hash.is_empty() {
            return false;
        }

        match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Apply a profile update. Empty arguments leave the field untouched.
    pub fn overwrite(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        bio: &str,
        image: &str,
    ) -> Result<(), PasswordError> {
        if !password.is_empty() {
            self.set_password(password)?;
        }
        if !username.is_empty() {
            self.username = username.to_string();
        }
        if !email.is_empty() {
            self.email = email.to_string();
        }
        if !bio.is_empty() {
            self.bio = bio.to_string();
        }
        if !image.is_empty() {
            self.image = image.to_string();
        }
        Ok(())
    }

    /// Check the fields the store requires before writing
    pub fn validate(&self) -> Result<(), String> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        if self.password_hash.is_empty() {
            return Err("Password is required".to_string());
        }
        Ok(())
    }
}

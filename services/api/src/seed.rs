//! Initial user loading from a TOML document
//!
//! ```toml
//! [[users]]
//! username = "alice"
//! email = "alice@example.com"
//! password = "secret"
//! ```

use std::path::Path;

use conduit_common::Database;
use config::{Config, File, FileFormat};
use rand::distributions::{Alphanumeric, DistString};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{SeedError, StoreError};
use crate::models::User;
use crate::repositories::{insert_user, now_millis};

const GENERATED_PASSWORD_LEN: usize = 32;

/// Parsed seed document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

/// One `[[users]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub email: String,
    /// A random password is hashed when absent
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub image: String,
}

impl SeedUser {
    fn into_user(self) -> Result<User, SeedError> {
        let password = self
            .password
            .filter(|password| !password.is_empty())
            .unwrap_or_else(|| {
                Alphanumeric.sample_string(&mut rand::thread_rng(), GENERATED_PASSWORD_LEN)
            });

        let mut user = User {
            username: self.username,
            email: self.email,
            bio: self.bio,
            image: self.image,
            ..User::default()
        };

        let checked = user
            .set_password(&password)
            .map_err(|e| e.to_string())
            .and_then(|_| user.validate());
        if let Err(message) = checked {
            return Err(SeedError::InsertFailed {
                username: user.username,
                source: StoreError::Validation(message),
            });
        }
        Ok(user)
    }
}

/// Read and parse a seed document
pub fn load(path: &Path) -> Result<SeedFile, SeedError> {
    if !path.is_file() {
        return Err(SeedError::FileMissing(path.to_path_buf()));
    }

    Config::builder()
        .add_source(File::from(path).format(FileFormat::Toml))
        .build()
        .and_then(|config| config.try_deserialize::<SeedFile>())
        .map_err(|e| SeedError::ParseFailed(e.to_string()))
}

/// Insert every user listed in the document at `path` in one transaction
///
/// Any failing insert rolls back the whole seed. Returns the number of users
/// inserted.
pub async fn seed(database: &Database, path: &Path) -> Result<usize, SeedError> {
    info!("Seeding users from {}", path.display());

    let users = load(path)?
        .users
        .into_iter()
        .map(SeedUser::into_user)
        .collect::<Result<Vec<_>, _>>()?;

    let now = now_millis();
    let mut tx = database.pool().begin().await.map_err(StoreError::from)?;

    for user in &users {
        if let Err(e) = insert_user(&mut tx, user, now).await {
            warn!("Rolling back seed: failed to insert {}: {}", user.username, e);
            return Err(SeedError::InsertFailed {
                username: user.username.clone(),
                source: StoreError::from(e),
            });
        }
    }

    tx.commit().await.map_err(StoreError::from)?;
    info!("Seeded {} users", users.len());
    Ok(users.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_is_hashed() {
        let seed_user = SeedUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: None,
            bio: String::new(),
            image: String::new(),
        };

        let user = seed_user.into_user().unwrap();
        assert!(user.password_hash.starts_with("$argon2"));
        assert!(!user.is_persisted());
    }

    #[test]
    fn test_invalid_email_names_the_user() {
        let seed_user = SeedUser {
            username: "bob".to_string(),
            email: "not-an-email".to_string(),
            password: Some("secret".to_string()),
            bio: String::new(),
            image: String::new(),
        };

        match seed_user.into_user() {
            Err(SeedError::InsertFailed { username, source }) => {
                assert_eq!(username, "bob");
                assert!(matches!(source, StoreError::Validation(_)));
            }
            other => panic!("Expected InsertFailed, got {:?}", other),
        }
    }
}

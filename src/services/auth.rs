//! Authentication service
//!
//! Provides password hashing with Argon2 and credential checks against the
//! user table.

use anyhow::Result;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use sqlx::SqlitePool;

use crate::db::UserRepository;
use crate::models::{User, UserRole};

/// Authentication service for user management
pub struct AuthService {
    pool: SqlitePool,
}

impl AuthService {
    /// Create a new auth service
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Hash a password using Argon2id
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();
        Ok(password_hash)
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Look up a user by username and check the password.
    ///
    /// Returns `None` for an unknown username or a wrong password. The
    /// account's active flag is left to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = UserRepository::new(&self.pool)
            .get_by_username(username)
            .await?
        else {
            return Ok(None);
        };

        if Self::verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Stamp `last_login` and return the refreshed user
    pub async fn record_login(&self, user: User) -> Result<User> {
        let repo = UserRepository::new(&self.pool);
        repo.record_login(user.id).await?;
        Ok(repo.get_by_id(user.id).await?.unwrap_or(user))
    }

    /// Hash the password and insert a new active account
    pub async fn create_user(&self, username: &str, password: &str, role: UserRole) -> Result<User> {
        let password_hash = Self::hash_password(password)?;
        UserRepository::new(&self.pool)
            .create(username, &password_hash, role)
            .await
    }

    /// Overwrite a user's password; `None` when the id is unknown
    pub async fn reset_password(&self, id: i64, new_password: &str) -> Result<Option<User>> {
        let password_hash = Self::hash_password(new_password)?;
        UserRepository::new(&self.pool)
            .update_password(id, &password_hash)
            .await
    }
}

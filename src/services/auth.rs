//! Authentication service
//!
//! Provides password hashing with Argon2 and user account storage.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use sqlx::SqlitePool;

use crate::models::{User, UserRole};
use crate::utils::validation::validate_username;

/// Authentication service for user management
pub struct AuthService {
    pool: SqlitePool,
}

impl AuthService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Hash a password using Argon2id
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
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

    /// Authenticate a user by username and password
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        match self.get_user_by_username(username).await? {
            Some(user) if Self::verify_password(password, &user.password_hash)? => Ok(Some(user)),
            _ => Ok(None),
        }
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, note FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by username")
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, note FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by ID")
    }

    /// Create a new user
    pub async fn create_user(&self, username: &str, password: &str, role: UserRole) -> Result<User> {
        if !validate_username(username) {
            anyhow::bail!("Invalid username: {}", username);
        }

        if password.len() < 8 {
            anyhow::bail!("Password must be at least 8 characters long");
        }

        if self.get_user_by_username(username).await?.is_some() {
            anyhow::bail!("Username already exists");
        }

        let password_hash = Self::hash_password(password)?;

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES (?, ?, ?)
            RETURNING id, username, password_hash, role, note
            "#,
        )
        .bind(username)
        .bind(&password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create user")
    }

    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }
}

//! User repository

use crate::config::MAX_NAME_LENGTH;
use crate::crypto;
use crate::database::models::User;
use crate::database::record::{Fields, RecordStore, Table};
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::SqlitePool;

pub struct UsersTable;

impl Table for UsersTable {
    const NAME: &'static str = "users";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &["name", "email", "password_hash", "created_at"];
    type Row = User;
}

#[derive(Clone)]
pub struct UserRepository {
    records: RecordStore<UsersTable>,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            records: RecordStore::new(pool),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        self.records.find_by_id(id).await
    }

    /// Emails compare case-insensitively
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = ? COLLATE NOCASE LIMIT 1",
        )
        .bind(email.trim())
        .fetch_optional(self.records.pool())
        .await?;

        Ok(user)
    }

    pub async fn exists(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? COLLATE NOCASE)",
        )
        .bind(email.trim())
        .fetch_one(self.records.pool())
        .await?;

        Ok(exists)
    }

    /// Create a user; the password is stored only as an Argon2 hash
    pub async fn create_user(&self, name: &str, email: &str, password: &str) -> Result<i64> {
        let name = name.trim();
        let email = email.trim();

        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(AppError::validation(format!(
                "User name must be between 1 and {} characters",
                MAX_NAME_LENGTH
            )));
        }
        if !email.contains('@') {
            return Err(AppError::validation(format!("Invalid email: '{}'", email)));
        }
        if password.is_empty() {
            return Err(AppError::validation("Password is required"));
        }
        if self.exists(email).await? {
            return Err(AppError::validation(format!(
                "A user with email '{}' already exists",
                email
            )));
        }

        let password_hash = crypto::hash_password(password)?;
        let fields = Fields::new()
            .with("name", name)
            .with("email", email)
            .with("password_hash", password_hash)
            .with("created_at", Utc::now());

        let id = self.records.create(&fields).await?;

        tracing::info!("Created user {}", id);
        Ok(id)
    }

    /// Returns the user only when the password matches
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };

        if crypto::verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            tracing::debug!("Credential check failed for user {}", user.id);
            Ok(None)
        }
    }
}

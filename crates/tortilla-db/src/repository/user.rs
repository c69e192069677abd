//! # User Repository
//!
//! Credential store: who may open a ledger, and who is an administrator.
//!
//! Passwords are stored as argon2 PHC strings (salted, parameters embedded),
//! never in plain text.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, warn};

use tortilla_core::validation::validate_required;

use crate::error::{DbError, DbResult};

/// Account created on first start when the store is empty.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// A stored account, without its password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserAccount {
    pub username: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Repository for the credential store.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates `admin` with `initial_password` when no account exists yet.
    ///
    /// ## Returns
    /// `true` if the admin account was created.
    pub async fn ensure_default_admin(&self, initial_password: &str) -> DbResult<bool> {
        if self.count().await? > 0 {
            return Ok(false);
        }
        self.upsert(DEFAULT_ADMIN_USERNAME, initial_password, true)
            .await?;
        warn!(
            username = DEFAULT_ADMIN_USERNAME,
            "Created default admin account; change its password"
        );
        Ok(true)
    }

    /// Creates an account, or replaces the password and role of an existing one.
    pub async fn upsert(&self, username: &str, password: &str, is_admin: bool) -> DbResult<()> {
        let username = username.trim();
        validate_required("username", username)?;
        validate_required("password", password)?;

        debug!(username, is_admin, "Saving user");
        let password_hash = hash_password(password)?;

        sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, is_admin, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(username) DO UPDATE SET
                password_hash = excluded.password_hash,
                is_admin = excluded.is_admin
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(is_admin)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(username, is_admin, "User saved");
        Ok(())
    }

    /// Checks a username/password pair.
    ///
    /// Unknown users and wrong passwords both return `false`.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<bool> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE username = ?1")
                .bind(username.trim())
                .fetch_optional(&self.pool)
                .await?;

        let ok = hash.is_some_and(|h| verify_password(password, &h));
        debug!(username, ok, "Authentication attempt");
        Ok(ok)
    }

    /// Whether `username` is an administrator (`false` for unknown users).
    pub async fn is_admin(&self, username: &str) -> DbResult<bool> {
        let flag: Option<bool> = sqlx::query_scalar("SELECT is_admin FROM users WHERE username = ?1")
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(flag.unwrap_or(false))
    }

    /// All accounts, ordered by username.
    pub async fn list(&self) -> DbResult<Vec<UserAccount>> {
        let users = sqlx::query_as::<_, UserAccount>(
            "SELECT username, is_admin, created_at FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Deletes an account.
    ///
    /// ## Errors
    /// - `NotFound` when the account does not exist
    pub async fn delete(&self, username: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?1")
            .bind(username.trim())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", username));
        }

        info!(username, "User deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

/// Hashes a password with a fresh random salt.
fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {e}")))
}

/// Verifies a password against a stored PHC string.
fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::Schema;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> UserRepository {
        Database::new(DbConfig::in_memory(), Schema::Users)
            .await
            .unwrap()
            .users()
    }

    #[tokio::test]
    async fn test_default_admin_created_once() {
        let repo = repo().await;
        assert!(repo.ensure_default_admin("admin123").await.unwrap());
        assert!(!repo.ensure_default_admin("other").await.unwrap());

        assert!(repo.authenticate("admin", "admin123").await.unwrap());
        assert!(repo.is_admin("admin").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_password_and_role() {
        let repo = repo().await;
        repo.upsert("maria", "first", false).await.unwrap();
        assert!(repo.authenticate("maria", "first").await.unwrap());
        assert!(!repo.is_admin("maria").await.unwrap());

        repo.upsert("maria", "second", true).await.unwrap();
        assert!(!repo.authenticate("maria", "first").await.unwrap());
        assert!(repo.authenticate("maria", "second").await.unwrap());
        assert!(repo.is_admin("maria").await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let repo = repo().await;
        assert!(!repo.authenticate("ghost", "x").await.unwrap());
        assert!(!repo.is_admin("ghost").await.unwrap());
        assert!(matches!(
            repo.delete("ghost").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let repo = repo().await;
        repo.upsert("zoe", "pw", false).await.unwrap();
        repo.upsert("ana", "pw", true).await.unwrap();

        let users = repo.list().await.unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["ana", "zoe"]);
        assert!(users[0].is_admin);

        repo.delete("zoe").await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected() {
        let repo = repo().await;
        assert!(matches!(
            repo.upsert(" ", "pw", false).await,
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            repo.upsert("maria", "", false).await,
            Err(DbError::Validation(_))
        ));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same", &a));
        assert!(!verify_password("different", &a));
        assert!(!verify_password("same", "not-a-phc-string"));
    }
}

//! # User Repository
//!
//! Storefront accounts. Passwords are stored as argon2 PHC strings and the
//! hash never leaves this module.
//!
//! ## Login
//! ```text
//! verify_credentials("admin", "secret")
//!      │
//!      ├── no such username/email ──► Ok(None)
//!      ├── hash mismatch ───────────► Ok(None)
//!      └── match ───────────────────► Ok(Some(User))   (blocked users too;
//!                                                       the caller decides)
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use shopfront_core::{User, UserRole};

const USER_COLUMNS: &str = "id, username, email, role, is_blocked, full_name, created_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    role: UserRole,
    is_blocked: bool,
    full_name: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            role: row.role,
            is_blocked: row.is_blocked,
            full_name: row.full_name,
            created_at: row.created_at,
        }
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub full_name: String,
}

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username or email taken
    pub async fn insert(&self, new_user: &NewUser) -> DbResult<User> {
        let user = User {
            id: generate_id(),
            username: new_user.username.trim().to_string(),
            email: new_user.email.trim().to_lowercase(),
            role: new_user.role,
            is_blocked: false,
            full_name: new_user.full_name.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(username = %user.username, role = ?user.role, "Creating user");

        let password_hash = hash_password(&new_user.password)?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, role, is_blocked, full_name, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&password_hash)
        .bind(user.role)
        .bind(user.is_blocked)
        .bind(&user.full_name)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field.ends_with("email") => {
                DbError::duplicate("email", &user.email)
            }
            DbError::UniqueViolation { .. } => DbError::duplicate("username", &user.username),
            other => other,
        })?;

        Ok(user)
    }

    /// Checks a login. `login` may be the username or the email.
    pub async fn verify_credentials(&self, login: &str, password: &str) -> DbResult<Option<User>> {
        let login = login.trim();

        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT id, password_hash FROM users WHERE username = ?1 OR email = lower(?1)",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, hash)) = row else {
            debug!(login = %login, "Login for unknown user");
            return Ok(None);
        };

        if !verify_password(password, &hash) {
            debug!(login = %login, "Password mismatch");
            return Ok(None);
        }

        self.get_by_id(&id).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    /// All accounts, newest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, username");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

//! Register-or-authenticate a worker
//!
//! Workers are never created by an operator. The first request carrying a
//! new name registers it with the supplied password; later requests must
//! present the same password. Every successful call refreshes the worker's
//! last-seen protocol version.

use selfplay_common::{digest, protocol::Credentials};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

pub const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertUserCommand {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub version: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    /// Whether this call registered the worker
    pub created: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum UpsertUserError {
    #[error("Username is required and cannot be empty")]
    UsernameRequired,
    #[error("Username must not exceed {MAX_USERNAME_LEN} characters")]
    UsernameLength,
    #[error("Password is required and cannot be empty")]
    PasswordRequired,
    #[error("Invalid password for user '{0}'")]
    AuthFailure(String),
    #[error("Worker credentials are required")]
    CredentialsRequired,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl UpsertUserCommand {
    /// Like [`Self::from_credentials`] for endpoints that refuse anonymous callers
    pub fn require(credentials: &Credentials) -> Result<Self, UpsertUserError> {
        Self::from_credentials(credentials).ok_or(UpsertUserError::CredentialsRequired)
    }

    /// Build the command from request credentials, `None` for anonymous requests
    pub fn from_credentials(credentials: &Credentials) -> Option<Self> {
        if credentials.is_anonymous() {
            return None;
        }
        Some(Self {
            username: credentials.user.clone().unwrap_or_default().trim().to_string(),
            password: credentials.password.clone().unwrap_or_default(),
            version: credentials.version,
        })
    }

    pub fn validate(&self) -> Result<(), UpsertUserError> {
        if self.username.trim().is_empty() {
            return Err(UpsertUserError::UsernameRequired);
        }
        if self.username.chars().count() > MAX_USERNAME_LEN {
            return Err(UpsertUserError::UsernameLength);
        }
        if self.password.is_empty() {
            return Err(UpsertUserError::PasswordRequired);
        }
        Ok(())
    }
}

fn password_hash(username: &str, password: &str) -> String {
    digest::sha256_hex(format!("{}:{}", username, password).as_bytes())
}

/// Upsert on an existing connection so callers can include it in a transaction
#[tracing::instrument(skip(conn, command), fields(username = %command.username))]
pub async fn upsert(
    conn: &mut SqliteConnection,
    command: UpsertUserCommand,
) -> Result<UserRecord, UpsertUserError> {
    command.validate()?;

    let hash = password_hash(&command.username, &command.password);

    let inserted = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, last_version)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (username) DO NOTHING
        "#,
    )
    .bind(&command.username)
    .bind(&hash)
    .bind(command.version)
    .execute(&mut *conn)
    .await?
    .rows_affected()
        == 1;

    let (id, stored_hash): (i64, String) =
        sqlx::query_as("SELECT id, password_hash FROM users WHERE username = ?1")
            .bind(&command.username)
            .fetch_one(&mut *conn)
            .await?;

    if stored_hash != hash {
        tracing::warn!("Rejected worker with wrong password");
        return Err(UpsertUserError::AuthFailure(command.username));
    }

    if inserted {
        tracing::info!(user_id = id, "Registered new worker");
    } else {
        sqlx::query(
            r#"
            UPDATE users
            SET last_version = COALESCE(?1, last_version), last_seen_at = datetime('now')
            WHERE id = ?2
            "#,
        )
        .bind(command.version)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(UserRecord {
        id,
        username: command.username,
        created: inserted,
    })
}

#[tracing::instrument(skip(pool, command))]
pub async fn handle(
    pool: SqlitePool,
    command: UpsertUserCommand,
) -> Result<UserRecord, UpsertUserError> {
    let mut conn = pool.acquire().await?;
    upsert(&mut conn, command).await
}

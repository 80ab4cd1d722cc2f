//! Record an uploaded self-play game
//!
//! Stores the training data a worker produced with a network and bumps that
//! network's games-played counter. The counter moves by exactly one per
//! successful upload and not at all when anything fails.

use crate::features::users::commands::{upsert, UpsertUserCommand, UpsertUserError};
use crate::storage::{self, SharedBlobStore};
use selfplay_common::{digest, protocol::Credentials};
use serde::{Deserialize, Serialize};
use crate::db::begin_write;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct RecordGameCommand {
    pub credentials: Credentials,
    pub training_run_id: i64,
    pub network_id: i64,
    pub pgn: String,
    /// Gzip-compressed training data, stored as received (may be empty)
    pub content: Vec<u8>,
}

impl std::fmt::Debug for RecordGameCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordGameCommand")
            .field("user", &self.credentials.user)
            .field("training_run_id", &self.training_run_id)
            .field("network_id", &self.network_id)
            .field("content_len", &self.content.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordGameResponse {
    pub training_game_id: i64,
    pub games_played: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordGameError {
    #[error("Network {0} does not exist")]
    NetworkNotFound(i64),
    #[error("Training run {0} does not exist")]
    TrainingRunNotFound(i64),
    #[error(transparent)]
    User(#[from] UpsertUserError),
    #[error("Storage error: {0}")]
    Storage(anyhow::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool, blobs))]
pub async fn handle(
    pool: SqlitePool,
    blobs: SharedBlobStore,
    command: RecordGameCommand,
) -> Result<RecordGameResponse, RecordGameError> {
    let user = UpsertUserCommand::require(&command.credentials)?;

    let mut tx = begin_write(&pool).await?;

    let network: Option<i64> = sqlx::query_scalar("SELECT id FROM networks WHERE id = ?1")
        .bind(command.network_id)
        .fetch_optional(&mut *tx)
        .await?;
    if network.is_none() {
        return Err(RecordGameError::NetworkNotFound(command.network_id));
    }

    let run: Option<i64> = sqlx::query_scalar("SELECT id FROM training_runs WHERE id = ?1")
        .bind(command.training_run_id)
        .fetch_optional(&mut *tx)
        .await?;
    if run.is_none() {
        return Err(RecordGameError::TrainingRunNotFound(command.training_run_id));
    }

    let user_id = upsert(&mut *tx, user).await?.id;

    let key = storage::training_game_key(
        command.training_run_id,
        command.network_id,
        &digest::sha256_hex(&command.content),
    );
    blobs
        .put(&key, command.content)
        .await
        .map_err(RecordGameError::Storage)?;

    let training_game_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO training_games (training_run_id, network_id, user_id, blob_key, pgn)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id
        "#,
    )
    .bind(command.training_run_id)
    .bind(command.network_id)
    .bind(user_id)
    .bind(&key)
    .bind(&command.pgn)
    .fetch_one(&mut *tx)
    .await?;

    let games_played: i64 = sqlx::query_scalar(
        "UPDATE networks SET games_played = games_played + 1 WHERE id = ?1 RETURNING games_played",
    )
    .bind(command.network_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(training_game_id, games_played, "Training game recorded");

    Ok(RecordGameResponse {
        training_game_id,
        games_played,
    })
}

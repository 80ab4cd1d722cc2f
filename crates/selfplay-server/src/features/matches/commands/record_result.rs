//! Record the result of a match game
//!
//! Each game takes exactly one result. The write is a conditional update on
//! `done = 0`, so of two concurrent reports for the same game only one
//! succeeds. After a successful write the match tally is offered to the
//! completion policy.

use super::super::policy::CompletionPolicy;
use super::super::queries::tally;
use super::complete::{complete, CompleteMatchError};
use crate::features::users::commands::{upsert, UpsertUserCommand, UpsertUserError};
use selfplay_common::protocol::{Credentials, GameResult};
use serde::{Deserialize, Serialize};
use crate::db::begin_write;
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct RecordMatchResultCommand {
    pub credentials: Credentials,
    pub match_game_id: i64,
    /// Relative to the candidate: 1 win, 0 draw, -1 loss
    pub result: i64,
    pub pgn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMatchResultResponse {
    pub match_game_id: i64,
    pub match_id: i64,
    /// Whether the match is closed after this result
    pub match_done: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RecordMatchResultError {
    #[error("Result must be -1, 0 or 1, got {0}")]
    InvalidResult(i64),
    #[error("Match game {0} not found")]
    NotFound(i64),
    #[error("Match game {0} already has a result")]
    AlreadyDone(i64),
    #[error(transparent)]
    User(#[from] UpsertUserError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RecordMatchResultCommand {
    pub fn validate(&self) -> Result<GameResult, RecordMatchResultError> {
        GameResult::try_from(self.result).map_err(|_| RecordMatchResultError::InvalidResult(self.result))
    }
}

#[tracing::instrument(skip(pool, policy, command), fields(match_game_id = command.match_game_id, result = command.result))]
pub async fn handle(
    pool: SqlitePool,
    policy: &dyn CompletionPolicy,
    command: RecordMatchResultCommand,
) -> Result<RecordMatchResultResponse, RecordMatchResultError> {
    let result = command.validate()?;
    let user = UpsertUserCommand::require(&command.credentials)?;

    let mut tx = begin_write(&pool).await?;
    upsert(&mut *tx, user).await?;

    let match_id: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE match_games
        SET result = ?1, pgn = ?2, done = 1, completed_at = datetime('now')
        WHERE id = ?3 AND done = 0
        RETURNING match_id
        "#,
    )
    .bind(result.as_i64())
    .bind(&command.pgn)
    .bind(command.match_game_id)
    .fetch_optional(&mut *tx)
    .await?;

    let match_id = match match_id {
        Some(id) => id,
        None => {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM match_games WHERE id = ?1")
                .bind(command.match_game_id)
                .fetch_optional(&mut *tx)
                .await?;
            return Err(match exists {
                Some(_) => RecordMatchResultError::AlreadyDone(command.match_game_id),
                None => RecordMatchResultError::NotFound(command.match_game_id),
            });
        },
    };

    tx.commit().await?;

    tracing::info!(match_id, %result, "Match game result recorded");

    let mut conn = pool.acquire().await?;
    let mut match_done = false;
    if let Some(current) = tally(&mut conn, match_id).await? {
        match_done = current.done;
        if !current.done && policy.should_complete(&current) {
            match complete(&mut conn, match_id).await {
                Ok(()) | Err(CompleteMatchError::AlreadyDone(_)) => match_done = true,
                Err(CompleteMatchError::NotFound(_)) => {},
                Err(CompleteMatchError::Database(e)) => return Err(e.into()),
            }
        }
    }

    Ok(RecordMatchResultResponse {
        match_game_id: command.match_game_id,
        match_id,
        match_done,
    })
}

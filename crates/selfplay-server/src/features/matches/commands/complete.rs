//! Close a match
//!
//! Once done, a match is never handed out again. Games already in flight may
//! still report their results.

use super::super::queries::{tally, MatchTally};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteMatchCommand {
    pub match_id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum CompleteMatchError {
    #[error("Match {0} not found")]
    NotFound(i64),
    #[error("Match {0} is already done")]
    AlreadyDone(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub async fn complete(conn: &mut SqliteConnection, match_id: i64) -> Result<(), CompleteMatchError> {
    let updated = sqlx::query("UPDATE matches SET done = 1 WHERE id = ?1 AND done = 0")
        .bind(match_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    if updated == 0 {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM matches WHERE id = ?1")
            .bind(match_id)
            .fetch_optional(&mut *conn)
            .await?;
        return Err(match exists {
            Some(_) => CompleteMatchError::AlreadyDone(match_id),
            None => CompleteMatchError::NotFound(match_id),
        });
    }

    tracing::info!(match_id, "Match completed");
    Ok(())
}

/// Complete the match and return its final tally
#[tracing::instrument(skip(pool))]
pub async fn handle(pool: SqlitePool, command: CompleteMatchCommand) -> Result<MatchTally, CompleteMatchError> {
    let mut conn = pool.acquire().await?;
    complete(&mut conn, command.match_id).await?;
    tally(&mut conn, command.match_id)
        .await?
        .ok_or(CompleteMatchError::NotFound(command.match_id))
}

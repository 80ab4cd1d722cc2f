//! Per-match result counts
//!
//! Results are stored relative to the candidate network, so `wins` are
//! candidate wins and `losses` candidate losses.

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchTally {
    pub match_id: i64,
    pub wins: i64,
    pub losses: i64,
    pub draws: i64,
    /// Allocated games without a reported result
    pub pending: i64,
    pub done: bool,
}

impl MatchTally {
    pub fn finished(&self) -> i64 {
        self.wins + self.losses + self.draws
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchTallyQuery {
    pub match_id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum MatchTallyError {
    #[error("Match {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub async fn tally(conn: &mut SqliteConnection, match_id: i64) -> Result<Option<MatchTally>, sqlx::Error> {
    sqlx::query_as::<_, MatchTally>(
        r#"
        SELECT
            m.id AS match_id,
            COALESCE(SUM(CASE WHEN g.done = 1 AND g.result = 1 THEN 1 ELSE 0 END), 0) AS wins,
            COALESCE(SUM(CASE WHEN g.done = 1 AND g.result = -1 THEN 1 ELSE 0 END), 0) AS losses,
            COALESCE(SUM(CASE WHEN g.done = 1 AND g.result = 0 THEN 1 ELSE 0 END), 0) AS draws,
            COALESCE(SUM(CASE WHEN g.id IS NOT NULL AND g.done = 0 THEN 1 ELSE 0 END), 0) AS pending,
            m.done AS done
        FROM matches m
        LEFT JOIN match_games g ON g.match_id = m.id
        WHERE m.id = ?1
        GROUP BY m.id, m.done
        "#,
    )
    .bind(match_id)
    .fetch_optional(&mut *conn)
    .await
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: SqlitePool, query: MatchTallyQuery) -> Result<MatchTally, MatchTallyError> {
    let mut conn = pool.acquire().await?;
    tally(&mut conn, query.match_id)
        .await?
        .ok_or(MatchTallyError::NotFound(query.match_id))
}

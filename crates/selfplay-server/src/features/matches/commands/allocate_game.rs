//! Match game allocation
//!
//! A single `INSERT ... SELECT` creates the game row only while its match is
//! still open and derives the side-assignment flag from the number of games
//! allocated before it, so concurrent allocations never need a lock.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AllocatedGame {
    pub id: i64,
    pub flip: bool,
}

/// Allocate the next game of `match_id`, `None` if the match is done or unknown
pub async fn allocate(
    conn: &mut SqliteConnection,
    match_id: i64,
    user_id: Option<i64>,
) -> Result<Option<AllocatedGame>, sqlx::Error> {
    let game = sqlx::query_as::<_, AllocatedGame>(
        r#"
        INSERT INTO match_games (match_id, user_id, flip)
        SELECT m.id, ?2, (SELECT COUNT(*) FROM match_games g WHERE g.match_id = m.id) % 2
        FROM matches m
        WHERE m.id = ?1 AND m.done = 0
        RETURNING id, flip
        "#,
    )
    .bind(match_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(game) = game {
        tracing::debug!(match_id, match_game_id = game.id, flip = game.flip, "Match game allocated");
    }

    Ok(game)
}

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

/// An undecided match with the hashes workers need to play it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OpenMatch {
    pub id: i64,
    pub parameters: String,
    pub candidate_sha: String,
    pub current_best_sha: String,
}

/// Oldest match of `training_run_id` that is not done
pub async fn find_open(
    conn: &mut SqliteConnection,
    training_run_id: i64,
) -> Result<Option<OpenMatch>, sqlx::Error> {
    sqlx::query_as::<_, OpenMatch>(
        r#"
        SELECT m.id, m.parameters, c.sha AS candidate_sha, b.sha AS current_best_sha
        FROM matches m
        JOIN networks c ON c.id = m.candidate_id
        JOIN networks b ON b.id = m.current_best_id
        WHERE m.training_run_id = ?1 AND m.done = 0
        ORDER BY m.id ASC
        LIMIT 1
        "#,
    )
    .bind(training_run_id)
    .fetch_optional(&mut *conn)
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::features::shared::test_helpers::{seed_match, seed_network, seed_training_run};

    #[tokio::test]
    async fn test_oldest_open_match_first() {
        let store = Store::open_in_memory().await.unwrap();
        let best = seed_network(store.pool(), "abcd").await;
        let candidate = seed_network(store.pool(), "efgh").await;
        let run = seed_training_run(store.pool(), Some(best)).await;

        let first = seed_match(store.pool(), run, candidate, best, "[\"--visits 10\"]").await;
        let second = seed_match(store.pool(), run, candidate, best, "").await;

        let mut conn = store.pool().acquire().await.unwrap();
        let open = find_open(&mut conn, run).await.unwrap().unwrap();
        assert_eq!(open.id, first);
        assert_eq!(open.candidate_sha, "efgh");
        assert_eq!(open.current_best_sha, "abcd");
        assert_eq!(open.parameters, "[\"--visits 10\"]");

        sqlx::query("UPDATE matches SET done = 1 WHERE id = ?")
            .bind(first)
            .execute(&mut *conn)
            .await
            .unwrap();
        assert_eq!(find_open(&mut conn, run).await.unwrap().unwrap().id, second);

        sqlx::query("UPDATE matches SET done = 1").execute(&mut *conn).await.unwrap();
        assert!(find_open(&mut conn, run).await.unwrap().is_none());
    }
}

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

/// The active training run joined with its best network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActiveTrainingRun {
    pub id: i64,
    pub description: String,
    pub train_parameters: String,
    pub best_network_id: Option<i64>,
    pub best_network_sha: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetActiveTrainingRunError {
    #[error("No active training run")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub async fn find_active(conn: &mut SqliteConnection) -> Result<Option<ActiveTrainingRun>, sqlx::Error> {
    sqlx::query_as::<_, ActiveTrainingRun>(
        r#"
        SELECT t.id, t.description, t.train_parameters, t.best_network_id,
               n.sha AS best_network_sha
        FROM training_runs t
        LEFT JOIN networks n ON n.id = t.best_network_id
        WHERE t.active = 1
        ORDER BY t.id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(&mut *conn)
    .await
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: SqlitePool) -> Result<ActiveTrainingRun, GetActiveTrainingRunError> {
    let mut conn = pool.acquire().await?;
    find_active(&mut conn)
        .await?
        .ok_or(GetActiveTrainingRunError::NotFound)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::features::shared::test_helpers::{seed_network, seed_training_run};

    #[tokio::test]
    async fn test_no_active_run() {
        let store = Store::open_in_memory().await.unwrap();
        assert!(matches!(
            handle(store.pool().clone()).await,
            Err(GetActiveTrainingRunError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_active_run_with_best_network() {
        let store = Store::open_in_memory().await.unwrap();
        let network = seed_network(store.pool(), "abcd").await;
        let run = seed_training_run(store.pool(), Some(network)).await;

        let active = handle(store.pool().clone()).await.unwrap();
        assert_eq!(active.id, run);
        assert_eq!(active.description, "Testing");
        assert_eq!(active.best_network_id, Some(network));
        assert_eq!(active.best_network_sha.as_deref(), Some("abcd"));
    }
}

//! Make a network the best network of its training run
//!
//! Called by the network upload inside its transaction, and exposed to
//! operators for rolling a run back to an earlier network.

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoteNetworkCommand {
    #[serde(default)]
    pub training_run_id: i64,
    pub network_id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum PromoteNetworkError {
    #[error("Training run {0} does not exist")]
    TrainingRunNotFound(i64),
    #[error("Network {0} does not exist")]
    NetworkNotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub async fn promote(
    conn: &mut SqliteConnection,
    command: &PromoteNetworkCommand,
) -> Result<(), PromoteNetworkError> {
    let network: Option<i64> = sqlx::query_scalar("SELECT id FROM networks WHERE id = ?1")
        .bind(command.network_id)
        .fetch_optional(&mut *conn)
        .await?;
    if network.is_none() {
        return Err(PromoteNetworkError::NetworkNotFound(command.network_id));
    }

    let updated = sqlx::query("UPDATE training_runs SET best_network_id = ?1 WHERE id = ?2")
        .bind(command.network_id)
        .bind(command.training_run_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(PromoteNetworkError::TrainingRunNotFound(command.training_run_id));
    }

    tracing::info!(
        training_run_id = command.training_run_id,
        network_id = command.network_id,
        "Best network promoted"
    );
    Ok(())
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: SqlitePool, command: PromoteNetworkCommand) -> Result<(), PromoteNetworkError> {
    let mut conn = pool.acquire().await?;
    promote(&mut conn, &command).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::features::shared::test_helpers::{seed_network, seed_training_run};

    #[tokio::test]
    async fn test_promote() {
        let store = Store::open_in_memory().await.unwrap();
        let old = seed_network(store.pool(), "abcd").await;
        let new = seed_network(store.pool(), "efgh").await;
        let run = seed_training_run(store.pool(), Some(old)).await;

        handle(
            store.pool().clone(),
            PromoteNetworkCommand {
                training_run_id: run,
                network_id: new,
            },
        )
        .await
        .unwrap();

        let best: Option<i64> = sqlx::query_scalar("SELECT best_network_id FROM training_runs WHERE id = ?")
            .bind(run)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(best, Some(new));
    }

    #[tokio::test]
    async fn test_promote_unknown_ids() {
        let store = Store::open_in_memory().await.unwrap();
        let network = seed_network(store.pool(), "abcd").await;

        let missing_run = handle(
            store.pool().clone(),
            PromoteNetworkCommand {
                training_run_id: 7,
                network_id: network,
            },
        )
        .await;
        assert!(matches!(missing_run, Err(PromoteNetworkError::TrainingRunNotFound(7))));

        let run = seed_training_run(store.pool(), None).await;
        let missing_network = handle(
            store.pool().clone(),
            PromoteNetworkCommand {
                training_run_id: run,
                network_id: 99,
            },
        )
        .await;
        assert!(matches!(missing_network, Err(PromoteNetworkError::NetworkNotFound(99))));
    }
}

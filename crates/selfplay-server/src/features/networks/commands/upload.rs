//! Upload a network
//!
//! Networks arrive gzip-compressed. They are identified by the SHA-256 of the
//! decompressed weights, stored decompressed under that hash, and promoted to
//! best network of the training run they were trained for.

use crate::features::shared::map_unique_violation;
use crate::features::training_runs::commands::{promote, PromoteNetworkCommand, PromoteNetworkError};
use crate::storage::{self, SharedBlobStore};
use selfplay_common::{codec, digest, protocol::UploadNetworkResponse};
use crate::db::begin_write;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct UploadNetworkCommand {
    pub training_run_id: i64,
    pub layers: i64,
    pub filters: i64,
    /// Gzip-compressed weights as sent by the trainer
    pub content: Vec<u8>,
}

impl std::fmt::Debug for UploadNetworkCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadNetworkCommand")
            .field("training_run_id", &self.training_run_id)
            .field("layers", &self.layers)
            .field("filters", &self.filters)
            .field("content_len", &self.content.len())
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadNetworkError {
    #[error("Network file is required and cannot be empty")]
    ContentRequired,
    #[error("Layers and filters must be positive")]
    InvalidShape,
    #[error("Network file is not valid gzip: {0}")]
    InvalidGzip(String),
    #[error("Network with hash '{0}' already exists")]
    AlreadyExists(String),
    #[error("Training run {0} does not exist")]
    TrainingRunNotFound(i64),
    #[error("Storage error: {0}")]
    Storage(anyhow::Error),
    #[error(transparent)]
    Promote(#[from] PromoteNetworkError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl UploadNetworkCommand {
    pub fn validate(&self) -> Result<(), UploadNetworkError> {
        if self.content.is_empty() {
            return Err(UploadNetworkError::ContentRequired);
        }
        if self.layers <= 0 || self.filters <= 0 {
            return Err(UploadNetworkError::InvalidShape);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, blobs), fields(sha = tracing::field::Empty))]
pub async fn handle(
    pool: SqlitePool,
    blobs: SharedBlobStore,
    command: UploadNetworkCommand,
) -> Result<UploadNetworkResponse, UploadNetworkError> {
    command.validate()?;

    let weights = codec::gunzip(&command.content)
        .map_err(|e| UploadNetworkError::InvalidGzip(e.to_string()))?;
    let sha = digest::sha256_hex(&weights);
    tracing::Span::current().record("sha", sha.as_str());

    let mut tx = begin_write(&pool).await?;

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM networks WHERE sha = ?1")
        .bind(&sha)
        .fetch_optional(&mut *tx)
        .await?;
    if existing.is_some() {
        return Err(UploadNetworkError::AlreadyExists(sha));
    }

    let run: Option<i64> = sqlx::query_scalar("SELECT id FROM training_runs WHERE id = ?1")
        .bind(command.training_run_id)
        .fetch_optional(&mut *tx)
        .await?;
    if run.is_none() {
        return Err(UploadNetworkError::TrainingRunNotFound(command.training_run_id));
    }

    // Identical content always maps to the same key, so a blob left behind by
    // a failed insert is overwritten harmlessly by the next attempt.
    let key = storage::network_key(&sha);
    blobs
        .put(&key, weights)
        .await
        .map_err(UploadNetworkError::Storage)?;

    let network_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO networks (training_run_id, sha, blob_key, layers, filters)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id
        "#,
    )
    .bind(command.training_run_id)
    .bind(&sha)
    .bind(&key)
    .bind(command.layers)
    .bind(command.filters)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        map_unique_violation(e, UploadNetworkError::AlreadyExists(sha.clone()), UploadNetworkError::Database)
    })?;

    promote(
        &mut *tx,
        &PromoteNetworkCommand {
            training_run_id: command.training_run_id,
            network_id,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(network_id, "Network uploaded");

    Ok(UploadNetworkResponse { network_id, sha })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::features::shared::test_helpers::{count, seed_training_run, temp_blobs};

    fn command(training_run_id: i64, weights: &[u8]) -> UploadNetworkCommand {
        UploadNetworkCommand {
            training_run_id,
            layers: 6,
            filters: 64,
            content: codec::gzip(weights).unwrap(),
        }
    }

    #[test]
    fn test_validation() {
        let mut cmd = command(1, b"weights");
        assert!(cmd.validate().is_ok());

        cmd.filters = 0;
        assert!(matches!(cmd.validate(), Err(UploadNetworkError::InvalidShape)));

        cmd.filters = 64;
        cmd.content.clear();
        assert!(matches!(cmd.validate(), Err(UploadNetworkError::ContentRequired)));
    }

    #[tokio::test]
    async fn test_upload_stores_decompressed_weights_and_promotes() {
        let store = Store::open_in_memory().await.unwrap();
        let (_dir, blobs) = temp_blobs().await;
        let run = seed_training_run(store.pool(), None).await;

        let response = handle(store.pool().clone(), blobs.clone(), command(run, b"weights"))
            .await
            .unwrap();

        assert_eq!(response.sha, digest::sha256_hex(b"weights"));
        assert_eq!(
            blobs.get(&storage::network_key(&response.sha)).await.unwrap(),
            Some(b"weights".to_vec())
        );

        let best: Option<i64> = sqlx::query_scalar("SELECT best_network_id FROM training_runs WHERE id = ?")
            .bind(run)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(best, Some(response.network_id));
    }

    #[tokio::test]
    async fn test_duplicate_upload_is_rejected() {
        let store = Store::open_in_memory().await.unwrap();
        let (_dir, blobs) = temp_blobs().await;
        let run = seed_training_run(store.pool(), None).await;

        handle(store.pool().clone(), blobs.clone(), command(run, b"weights"))
            .await
            .unwrap();
        let second = handle(store.pool().clone(), blobs, command(run, b"weights")).await;

        assert!(matches!(second, Err(UploadNetworkError::AlreadyExists(_))));
        assert_eq!(count(store.pool(), "networks").await, 1);
    }

    #[tokio::test]
    async fn test_unknown_run_and_bad_gzip() {
        let store = Store::open_in_memory().await.unwrap();
        let (_dir, blobs) = temp_blobs().await;

        let missing = handle(store.pool().clone(), blobs.clone(), command(5, b"weights")).await;
        assert!(matches!(missing, Err(UploadNetworkError::TrainingRunNotFound(5))));

        let mut raw = command(5, b"weights");
        raw.content = b"not gzip".to_vec();
        let invalid = handle(store.pool().clone(), blobs, raw).await;
        assert!(matches!(invalid, Err(UploadNetworkError::InvalidGzip(_))));

        assert_eq!(count(store.pool(), "networks").await, 0);
    }
}

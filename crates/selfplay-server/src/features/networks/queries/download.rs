use crate::storage::SharedBlobStore;
use selfplay_common::codec;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadNetworkQuery {
    pub sha: String,
}

/// Gzip-compressed weights ready to be sent to a worker
#[derive(Debug, Clone)]
pub struct NetworkDownload {
    pub sha: String,
    pub content: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadNetworkError {
    #[error("Network hash is required and cannot be empty")]
    ShaRequired,
    #[error("Network '{0}' not found")]
    NotFound(String),
    #[error("Weights of network '{0}' are missing from storage")]
    BlobMissing(String),
    #[error("Storage error: {0}")]
    Storage(anyhow::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DownloadNetworkQuery {
    pub fn validate(&self) -> Result<(), DownloadNetworkError> {
        if self.sha.trim().is_empty() {
            return Err(DownloadNetworkError::ShaRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, blobs), fields(sha = %query.sha))]
pub async fn handle(
    pool: SqlitePool,
    blobs: SharedBlobStore,
    query: DownloadNetworkQuery,
) -> Result<NetworkDownload, DownloadNetworkError> {
    query.validate()?;
    let sha = query.sha.trim().to_ascii_lowercase();

    let blob_key: Option<String> = sqlx::query_scalar("SELECT blob_key FROM networks WHERE sha = ?1")
        .bind(&sha)
        .fetch_optional(&pool)
        .await?;
    let blob_key = blob_key.ok_or_else(|| DownloadNetworkError::NotFound(sha.clone()))?;

    let weights = blobs
        .get(&blob_key)
        .await
        .map_err(DownloadNetworkError::Storage)?
        .ok_or_else(|| DownloadNetworkError::BlobMissing(sha.clone()))?;

    let content = codec::gzip(&weights).map_err(|e| DownloadNetworkError::Storage(e.into()))?;

    tracing::debug!(bytes = content.len(), "Serving network");

    Ok(NetworkDownload { sha, content })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::features::shared::test_helpers::{seed_network, temp_blobs};
    use crate::storage;

    #[tokio::test]
    async fn test_download_recompresses_stored_weights() {
        let store = Store::open_in_memory().await.unwrap();
        let (_dir, blobs) = temp_blobs().await;
        seed_network(store.pool(), "abcd").await;
        blobs.put(&storage::network_key("abcd"), b"weights".to_vec()).await.unwrap();

        let download = handle(
            store.pool().clone(),
            blobs,
            DownloadNetworkQuery { sha: "ABCD".to_string() },
        )
        .await
        .unwrap();

        assert_eq!(download.sha, "abcd");
        assert_eq!(codec::gunzip(&download.content).unwrap(), b"weights");
    }

    #[tokio::test]
    async fn test_unknown_and_missing() {
        let store = Store::open_in_memory().await.unwrap();
        let (_dir, blobs) = temp_blobs().await;

        let unknown = handle(
            store.pool().clone(),
            blobs.clone(),
            DownloadNetworkQuery { sha: "abcd".to_string() },
        )
        .await;
        assert!(matches!(unknown, Err(DownloadNetworkError::NotFound(_))));

        seed_network(store.pool(), "abcd").await;
        let missing = handle(
            store.pool().clone(),
            blobs.clone(),
            DownloadNetworkQuery { sha: "abcd".to_string() },
        )
        .await;
        assert!(matches!(missing, Err(DownloadNetworkError::BlobMissing(_))));

        let empty = handle(store.pool().clone(), blobs, DownloadNetworkQuery { sha: " ".to_string() }).await;
        assert!(matches!(empty, Err(DownloadNetworkError::ShaRequired)));
    }
}

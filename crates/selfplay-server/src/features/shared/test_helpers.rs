//! Test fixtures for feature unit tests
//!
//! ```rust,ignore
//! let store = Store::open_in_memory().await?;
//! let best = seed_network(store.pool(), "abcd").await;
//! let run = seed_training_run(store.pool(), Some(best)).await;
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::storage::{FsBlobStore, SharedBlobStore};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

/// Insert a network row with an arbitrary (not necessarily real) hash
pub async fn seed_network(pool: &SqlitePool, sha: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO networks (sha, blob_key) VALUES (?, ?) RETURNING id")
        .bind(sha)
        .bind(crate::storage::network_key(sha))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Insert an active training run
pub async fn seed_training_run(pool: &SqlitePool, best_network_id: Option<i64>) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO training_runs (description, best_network_id, active) VALUES ('Testing', ?, 1) RETURNING id",
    )
    .bind(best_network_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Insert an open match
pub async fn seed_match(
    pool: &SqlitePool,
    training_run_id: i64,
    candidate_id: i64,
    current_best_id: i64,
    parameters: &str,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO matches (training_run_id, candidate_id, current_best_id, parameters) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(training_run_id)
    .bind(candidate_id)
    .bind(current_best_id)
    .bind(parameters)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Filesystem blob store in a fresh temporary directory
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub async fn temp_blobs() -> (TempDir, SharedBlobStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = FsBlobStore::new(dir.path()).await.unwrap();
    (dir, Arc::new(store))
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

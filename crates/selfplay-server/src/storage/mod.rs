//! Blob storage for network weights and uploaded training data
//!
//! Rows in the database refer to blobs by key; the bytes themselves live
//! behind the [`BlobStore`] trait. Two backends ship: a local directory tree
//! ([`FsBlobStore`]) and an S3-compatible bucket ([`S3BlobStore`]).

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub mod config;
pub mod fs;
pub mod s3;

pub use config::{StorageBackend, StorageConfig};
pub use fs::FsBlobStore;
pub use s3::S3BlobStore;

/// Minimal read/write/exists contract the coordinator needs from storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`, replacing any previous content
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<()>;

    /// Fetch the blob stored under `key`, `None` if absent
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn exists(&self, key: &str) -> Result<bool>;
}

/// Shared, dynamically dispatched blob store
pub type SharedBlobStore = Arc<dyn BlobStore>;

/// Build the backend selected by `config`
pub async fn from_config(config: &StorageConfig) -> Result<SharedBlobStore> {
    let store: SharedBlobStore = match &config.backend {
        StorageBackend::Fs { root } => Arc::new(FsBlobStore::new(root).await?),
        StorageBackend::S3(s3) => Arc::new(S3BlobStore::new(s3.clone())),
    };
    Ok(store)
}

/// Key under which a network's weights are stored
pub fn network_key(sha: &str) -> String {
    format!("networks/{}", sha)
}

/// Key under which an uploaded training game is stored
pub fn training_game_key(training_run_id: i64, network_id: i64, content_sha: &str) -> String {
    format!("training/{}/{}/{}.gz", training_run_id, network_id, content_sha)
}

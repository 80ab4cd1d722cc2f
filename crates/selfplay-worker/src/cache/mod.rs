//! On-disk cache of downloaded networks
//!
//! Networks live decompressed under `<work_dir>/networks/<sha>`. A file only
//! appears under its final name after its content has been verified against
//! the sha it was requested by.

use crate::api::ApiClient;
use crate::error::{Result, WorkerError};
use async_trait::async_trait;
use selfplay_common::{codec, digest};
use std::path::{Path, PathBuf};

/// Anything that can hand out gzip-compressed network bytes by hash
#[async_trait]
pub trait NetworkSource: Send + Sync {
    async fn fetch_network(&self, sha: &str) -> Result<Vec<u8>>;
}

#[async_trait]
impl NetworkSource for ApiClient {
    async fn fetch_network(&self, sha: &str) -> Result<Vec<u8>> {
        self.download_network(sha).await
    }
}

pub struct NetworkCache {
    dir: PathBuf,
}

impl NetworkCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the network `sha` is (or would be) stored
    pub fn path_for(&self, sha: &str) -> PathBuf {
        self.dir.join(sha.to_ascii_lowercase())
    }

    pub fn contains(&self, sha: &str) -> bool {
        self.path_for(sha).is_file()
    }

    /// Cache a single network for self-play, dropping every other one
    pub async fn get_single(&self, source: &dyn NetworkSource, sha: &str) -> Result<PathBuf> {
        check_sha(sha)?;
        let evicted = self.evict_except(&[sha]).await?;
        if evicted > 0 {
            tracing::debug!(evicted, "Cleared old networks from cache");
        }
        self.get(source, sha).await
    }

    /// Cache both networks of a match; neither evicts the other
    pub async fn get_pair(
        &self,
        source: &dyn NetworkSource,
        first: &str,
        second: &str,
    ) -> Result<(PathBuf, PathBuf)> {
        let first = self.get(source, first).await?;
        let second = self.get(source, second).await?;
        Ok((first, second))
    }

    async fn get(&self, source: &dyn NetworkSource, sha: &str) -> Result<PathBuf> {
        check_sha(sha)?;
        let path = self.path_for(sha);
        if path.is_file() {
            tracing::debug!(sha, "Network cache hit");
            return Ok(path);
        }

        tracing::info!(sha, "Downloading network");
        let compressed = source.fetch_network(sha).await?;
        self.store(sha, &compressed).await
    }

    /// Verify and persist a downloaded network
    ///
    /// Content is decompressed and hashed first; on a mismatch nothing is
    /// written. The file is written under a temporary name and renamed into
    /// place.
    pub async fn store(&self, sha: &str, compressed: &[u8]) -> Result<PathBuf> {
        let weights = codec::gunzip(compressed)?;
        digest::verify(&weights, sha)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(sha);
        let tmp = self.dir.join(format!(".{}.part", sha.to_ascii_lowercase()));
        tokio::fs::write(&tmp, &weights).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::info!(sha, bytes = weights.len(), "Network cached");
        Ok(path)
    }

    /// Remove every cached entry not named in `keep`, returns how many went
    pub async fn evict_except(&self, keep: &[&str]) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if keep.iter().any(|k| k.eq_ignore_ascii_case(&name)) {
                continue;
            }
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                tokio::fs::remove_dir_all(&path).await?;
            } else {
                tokio::fs::remove_file(&path).await?;
            }
            removed += 1;
        }
        Ok(removed)
    }
}

/// Hashes become file names, so only hex digits are accepted
fn check_sha(sha: &str) -> Result<()> {
    if sha.is_empty() || !sha.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(WorkerError::protocol(format!("Invalid network hash '{}'", sha)));
    }
    Ok(())
}

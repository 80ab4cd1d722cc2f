use super::BlobStore;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument};

/// Blob store backed by a local directory
///
/// Keys map to relative paths below `root`. Writes go to a temporary sibling
/// first and are renamed into place, so readers never observe a partial blob.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create storage root {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            bail!("Invalid blob key: {:?}", key);
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("partial");
        tokio::fs::write(&tmp, &data)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to move blob into {}", path.display()))?;

        debug!(path = %path.display(), "Stored blob");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().join("blobs")).await.unwrap();

        assert!(!store.exists("networks/abcd").await.unwrap());
        assert_eq!(store.get("networks/abcd").await.unwrap(), None);

        store.put("networks/abcd", b"weights".to_vec()).await.unwrap();
        assert!(store.exists("networks/abcd").await.unwrap());
        assert_eq!(store.get("networks/abcd").await.unwrap().unwrap(), b"weights");

        store.put("networks/abcd", b"replaced".to_vec()).await.unwrap();
        assert_eq!(store.get("networks/abcd").await.unwrap().unwrap(), b"replaced");
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path()).await.unwrap();

        assert!(store.put("../outside", vec![1]).await.is_err());
        assert!(store.put("/etc/passwd", vec![1]).await.is_err());
        assert!(store.get("").await.is_err());
    }
}

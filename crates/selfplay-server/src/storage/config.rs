use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default directory for the filesystem backend
pub const DEFAULT_STORAGE_ROOT: &str = "./data";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageBackend {
    Fs { root: PathBuf },
    S3(S3Config),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub prefix: String,
    pub access_key: String,
    pub secret_key: String,
    pub path_style: bool,
}

impl StorageConfig {
    /// Read `STORAGE_BACKEND` (`fs` or `s3`) and the matching settings
    pub fn from_env() -> anyhow::Result<Self> {
        let kind = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "fs".to_string());

        let backend = match kind.to_lowercase().as_str() {
            "fs" | "file" | "local" => StorageBackend::Fs {
                root: env::var("STORAGE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_ROOT)),
            },
            "s3" => StorageBackend::S3(S3Config::from_env()),
            other => anyhow::bail!("Unknown STORAGE_BACKEND '{}' (expected fs or s3)", other),
        };

        Ok(Self { backend })
    }

    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackend::Fs { root: root.into() },
        }
    }
}

impl S3Config {
    pub fn from_env() -> Self {
        Self {
            endpoint: env::var("S3_ENDPOINT").ok(),
            region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            bucket: env::var("S3_BUCKET").unwrap_or_else(|_| "selfplay".to_string()),
            prefix: env::var("S3_PREFIX").unwrap_or_default(),
            access_key: env::var("S3_ACCESS_KEY")
                .or_else(|_| env::var("AWS_ACCESS_KEY_ID"))
                .unwrap_or_else(|_| "minioadmin".to_string()),
            secret_key: env::var("S3_SECRET_KEY")
                .or_else(|_| env::var("AWS_SECRET_ACCESS_KEY"))
                .unwrap_or_else(|_| "minioadmin".to_string()),
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    pub fn for_minio(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: "us-east-1".to_string(),
            bucket: bucket.into(),
            prefix: String::new(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            path_style: true,
        }
    }
}

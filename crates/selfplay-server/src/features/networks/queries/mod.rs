pub mod download;

pub use download::{DownloadNetworkError, DownloadNetworkQuery, NetworkDownload};

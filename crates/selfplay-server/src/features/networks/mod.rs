//! Network artifact store
//!
//! Content-addressed network weights plus the training games produced with
//! them. Workers download networks by hash and upload training data citing
//! the network that generated it.

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    RecordGameCommand, RecordGameError, RecordGameResponse, UploadNetworkCommand,
    UploadNetworkError,
};
pub use queries::{DownloadNetworkError, DownloadNetworkQuery, NetworkDownload};
pub use routes::networks_routes;

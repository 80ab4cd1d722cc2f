//! HTTP API client for the selfplay coordinator
//!
//! Requests are form encoded (multipart for uploads), responses are JSON.
//! Every call carries the worker's credentials.

use crate::api::{endpoints, types::*};
use crate::error::{Result, WorkerError};
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use selfplay_common::protocol::{fields, Credentials, MatchResultRequest, WorkAssignment};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// API Client Constants
// ============================================================================

/// Default timeout for API requests in seconds.
/// Set to 5 minutes to accommodate large network downloads.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 300;

/// Default coordinator URL when not specified on the command line.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// A finished self-play game ready for upload
#[derive(Debug, Clone)]
pub struct GameUpload {
    pub training_id: i64,
    pub network_id: i64,
    pub pgn: String,
    /// Gzip-compressed training data written by the engine
    pub data_path: PathBuf,
}

/// API client for the coordinator
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("selfplay-worker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Ask the coordinator for the next piece of work
    pub async fn next_game(&self) -> Result<WorkAssignment> {
        let url = endpoints::next_game_url(&self.base_url);

        let response = self.client.post(&url).form(&self.credentials).send().await?;
        let body = ensure_success(response).await?.bytes().await?;

        serde_json::from_slice(&body)
            .map_err(|e| WorkerError::protocol(format!("Unrecognized work assignment: {}", e)))
    }

    /// Download a network by hash
    ///
    /// Returns the gzip-compressed bytes exactly as served.
    pub async fn download_network(&self, sha: &str) -> Result<Vec<u8>> {
        let url = endpoints::get_network_url(&self.base_url, sha);

        let response = self.client.get(&url).send().await?;
        let bytes = ensure_success(response).await?.bytes().await?.to_vec();

        Ok(bytes)
    }

    /// Upload the training data of one self-play game
    pub async fn upload_game(&self, upload: &GameUpload) -> Result<GameUploaded> {
        let url = endpoints::upload_game_url(&self.base_url);

        let data = tokio::fs::read(&upload.data_path).await?;
        let file_name = upload
            .data_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "training.0.gz".to_string());
        let file = Part::bytes(data)
            .file_name(file_name)
            .mime_str("application/gzip")?;

        let form = self
            .credential_form()
            .text(fields::TRAINING_ID, upload.training_id.to_string())
            .text(fields::NETWORK_ID, upload.network_id.to_string())
            .text(fields::PGN, upload.pgn.clone())
            .part(fields::FILE, file);

        let response = self.client.post(&url).multipart(form).send().await?;
        let api_response: ApiResponse<GameUploaded> = ensure_success(response).await?.json().await?;

        Ok(api_response.data)
    }

    /// Report the outcome of a match game
    pub async fn match_result(&self, request: &MatchResultRequest) -> Result<MatchResultRecorded> {
        let url = endpoints::match_result_url(&self.base_url);

        let response = self.client.post(&url).form(request).send().await?;
        let api_response: ApiResponse<MatchResultRecorded> =
            ensure_success(response).await?.json().await?;

        Ok(api_response.data)
    }

    fn credential_form(&self) -> Form {
        let mut form = Form::new();
        if let Some(user) = &self.credentials.user {
            form = form.text(fields::USER, user.clone());
        }
        if let Some(password) = &self.credentials.password {
            form = form.text(fields::PASSWORD, password.clone());
        }
        if let Some(version) = self.credentials.version {
            form = form.text(fields::VERSION, version.to_string());
        }
        form
    }
}

/// Turn a non-success status into [`WorkerError::Api`], keeping the
/// coordinator's error message when the body carries one
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string(),
        Err(_) => body,
    };

    Err(WorkerError::api(status.as_u16(), message))
}

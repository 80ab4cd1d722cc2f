//! Network and training-game routes spoken by trainers and workers
//!
//! - `POST /upload_network` - multipart {training_id, layers, filters, file}
//! - `GET /get_network?sha=` - gzip-compressed weights
//! - `POST /upload_game` - multipart {user, password, version, training_id, network_id, pgn, file}

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::shared::{MultipartError, MultipartForm};
use crate::features::{users, FeatureState};
use axum::{
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use selfplay_common::protocol::{fields, Credentials};

use super::{
    commands::{RecordGameCommand, RecordGameError, UploadNetworkCommand, UploadNetworkError},
    queries::{DownloadNetworkError, DownloadNetworkQuery},
};

pub fn networks_routes() -> Router<FeatureState> {
    Router::new()
        .route("/upload_network", post(upload_network))
        .route("/get_network", get(get_network))
        .route("/upload_game", post(upload_game))
}

/// `POST /upload_network`
///
/// - `201 Created` - `{network_id, sha}`; the network is now the run's best network
/// - `400 Bad Request` - Missing fields, invalid gzip, or the hash already exists
/// - `404 Not Found` - Unknown training run
#[tracing::instrument(skip(state, multipart))]
async fn upload_network(
    State(state): State<FeatureState>,
    multipart: Multipart,
) -> Result<Response, NetworkApiError> {
    let mut form = MultipartForm::read(multipart).await?;

    let command = UploadNetworkCommand {
        training_run_id: form.required(fields::TRAINING_ID)?,
        layers: form.required(fields::LAYERS)?,
        filters: form.required(fields::FILTERS)?,
        content: form.take_file().unwrap_or_default(),
    };

    let response = super::commands::upload::handle(state.db, state.blobs, command).await?;

    tracing::info!(
        network_id = response.network_id,
        sha = %response.sha,
        "Network uploaded via API"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

/// `GET /get_network?sha=<hash>`
#[tracing::instrument(skip(state), fields(sha = %query.sha))]
async fn get_network(
    State(state): State<FeatureState>,
    Query(query): Query<DownloadNetworkQuery>,
) -> Result<Response, NetworkApiError> {
    let download = super::queries::download::handle(state.db, state.blobs, query).await?;

    let disposition = format!("attachment; filename=\"{}.gz\"", download.sha);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/gzip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.content,
    )
        .into_response())
}

/// `POST /upload_game`
///
/// - `200 OK` - `{training_game_id, games_played}`
/// - `400 Bad Request` - Missing fields or no `file` part
/// - `401 Unauthorized` - Known worker name with a different password
/// - `404 Not Found` - Unknown network or training run
#[tracing::instrument(skip(state, multipart))]
async fn upload_game(
    State(state): State<FeatureState>,
    multipart: Multipart,
) -> Result<Response, NetworkApiError> {
    let mut form = MultipartForm::read(multipart).await?;

    let command = RecordGameCommand {
        credentials: Credentials {
            user: form.text(fields::USER),
            password: form.text(fields::PASSWORD),
            version: form.optional(fields::VERSION)?,
        },
        training_run_id: form.required(fields::TRAINING_ID)?,
        network_id: form.required(fields::NETWORK_ID)?,
        pgn: form.text(fields::PGN).unwrap_or_default(),
        // An empty game file is valid; only a missing part is rejected
        content: form.take_file().ok_or(MultipartError::Missing(fields::FILE))?,
    };

    let response = super::commands::record_game::handle(state.db, state.blobs, command).await?;

    Ok(ApiResponse::success(response).into_response())
}

#[derive(Debug, thiserror::Error)]
enum NetworkApiError {
    #[error(transparent)]
    Form(#[from] MultipartError),
    #[error(transparent)]
    Upload(#[from] UploadNetworkError),
    #[error(transparent)]
    Download(#[from] DownloadNetworkError),
    #[error(transparent)]
    RecordGame(#[from] RecordGameError),
}

fn internal(context: &str, err: &NetworkApiError) -> Response {
    tracing::error!("{}: {}", context, err);
    let (code, message) = match err {
        NetworkApiError::Upload(UploadNetworkError::Storage(_))
        | NetworkApiError::Download(DownloadNetworkError::Storage(_))
        | NetworkApiError::Download(DownloadNetworkError::BlobMissing(_))
        | NetworkApiError::RecordGame(RecordGameError::Storage(_)) => {
            ("STORAGE_ERROR", "A storage error occurred")
        },
        _ => ("INTERNAL_ERROR", "A database error occurred"),
    };
    ErrorResponse::new(code, message).into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for NetworkApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            NetworkApiError::Form(_)
            | NetworkApiError::Upload(UploadNetworkError::ContentRequired)
            | NetworkApiError::Upload(UploadNetworkError::InvalidShape)
            | NetworkApiError::Upload(UploadNetworkError::InvalidGzip(_))
            | NetworkApiError::Download(DownloadNetworkError::ShaRequired) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },
            NetworkApiError::Upload(UploadNetworkError::AlreadyExists(_)) => {
                (StatusCode::BAD_REQUEST, "ALREADY_EXISTS")
            },
            NetworkApiError::Upload(UploadNetworkError::TrainingRunNotFound(_))
            | NetworkApiError::Download(DownloadNetworkError::NotFound(_))
            | NetworkApiError::RecordGame(RecordGameError::NetworkNotFound(_))
            | NetworkApiError::RecordGame(RecordGameError::TrainingRunNotFound(_)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            },
            NetworkApiError::RecordGame(RecordGameError::User(err)) => {
                return users::error_response(err);
            },
            NetworkApiError::Upload(_) => return internal("Network upload failed", &self),
            NetworkApiError::Download(_) => return internal("Network download failed", &self),
            NetworkApiError::RecordGame(_) => return internal("Game upload failed", &self),
        };

        ErrorResponse::new(code, self.to_string()).into_response_with(status)
    }
}

//! Training run operator routes
//!
//! - `POST /api/v1/training-runs` - Create a run (active by default)
//! - `GET /api/v1/training-runs/active` - The active run and its best network
//! - `POST /api/v1/training-runs/:id/best` - Promote a network by hand

use crate::api::response::{ApiResponse, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use super::{
    commands::{
        CreateTrainingRunCommand, CreateTrainingRunError, PromoteNetworkCommand,
        PromoteNetworkError,
    },
    queries::GetActiveTrainingRunError,
};

pub fn training_runs_routes() -> Router<SqlitePool> {
    Router::new()
        .route("/", post(create_training_run))
        .route("/active", get(get_active_training_run))
        .route("/:id/best", post(promote_network))
}

/// `POST /api/v1/training-runs`
///
/// - `201 Created` - Run created
/// - `400 Bad Request` - Empty description
/// - `404 Not Found` - `best_network_id` does not exist
#[tracing::instrument(skip(pool, command))]
async fn create_training_run(
    State(pool): State<SqlitePool>,
    Json(command): Json<CreateTrainingRunCommand>,
) -> Result<Response, TrainingRunApiError> {
    let record = super::commands::create::handle(pool, command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(record))).into_response())
}

#[tracing::instrument(skip(pool))]
async fn get_active_training_run(
    State(pool): State<SqlitePool>,
) -> Result<Response, TrainingRunApiError> {
    let run = super::queries::get_active::handle(pool).await?;
    Ok(ApiResponse::success(run).into_response())
}

#[derive(Debug, Deserialize)]
struct PromoteBody {
    network_id: i64,
}

/// `POST /api/v1/training-runs/:id/best`
#[tracing::instrument(skip(pool, body), fields(training_run_id = id, network_id = body.network_id))]
async fn promote_network(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(body): Json<PromoteBody>,
) -> Result<Response, TrainingRunApiError> {
    let command = PromoteNetworkCommand {
        training_run_id: id,
        network_id: body.network_id,
    };
    super::commands::promote::handle(pool, command.clone()).await?;
    Ok(ApiResponse::success(command).into_response())
}

#[derive(Debug, thiserror::Error)]
enum TrainingRunApiError {
    #[error(transparent)]
    Create(#[from] CreateTrainingRunError),
    #[error(transparent)]
    Promote(#[from] PromoteNetworkError),
    #[error(transparent)]
    GetActive(#[from] GetActiveTrainingRunError),
}

impl IntoResponse for TrainingRunApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Create(CreateTrainingRunError::DescriptionRequired) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },
            Self::Create(CreateTrainingRunError::NetworkNotFound(_))
            | Self::Promote(PromoteNetworkError::NetworkNotFound(_))
            | Self::Promote(PromoteNetworkError::TrainingRunNotFound(_))
            | Self::GetActive(GetActiveTrainingRunError::NotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            },
            Self::Create(CreateTrainingRunError::Database(_))
            | Self::Promote(PromoteNetworkError::Database(_))
            | Self::GetActive(GetActiveTrainingRunError::Database(_)) => {
                tracing::error!("Database error in training run API: {}", self);
                return ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR);
            },
        };

        ErrorResponse::new(code, self.to_string()).into_response_with(status)
    }
}

//! Match routes
//!
//! Worker surface:
//! - `POST /match_result` - form {user, password, version, match_game_id, result, pgn}
//!
//! Operator surface, nested under `/api/v1/matches`:
//! - `POST /` - Create a match
//! - `POST /:id/done` - Close a match
//! - `GET /:id/tally` - Wins, losses, draws and pending games of a match

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::{users, FeatureState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use selfplay_common::protocol::MatchResultRequest;
use sqlx::SqlitePool;

use super::{
    commands::{
        CompleteMatchCommand, CompleteMatchError, CreateMatchCommand, CreateMatchError,
        RecordMatchResultCommand, RecordMatchResultError,
    },
    queries::{MatchTallyError, MatchTallyQuery},
};

pub fn match_result_routes() -> Router<FeatureState> {
    Router::new().route("/match_result", post(match_result))
}

pub fn matches_routes() -> Router<SqlitePool> {
    Router::new()
        .route("/", post(create_match))
        .route("/:id/done", post(complete_match))
        .route("/:id/tally", get(match_tally))
}

/// `POST /match_result`
///
/// - `200 OK` - `{match_game_id, match_id, match_done}`
/// - `400 Bad Request` - Result outside {-1, 0, 1}
/// - `401 Unauthorized` - Wrong password
/// - `404 Not Found` - Unknown match game
/// - `409 Conflict` - The game already has a result
#[tracing::instrument(skip(state, request), fields(match_game_id = request.match_game_id))]
async fn match_result(
    State(state): State<FeatureState>,
    Form(request): Form<MatchResultRequest>,
) -> Result<Response, MatchApiError> {
    let command = RecordMatchResultCommand {
        credentials: request.credentials(),
        match_game_id: request.match_game_id,
        result: request.result,
        pgn: request.pgn,
    };

    let response =
        super::commands::record_result::handle(state.db, state.completion.as_ref(), command).await?;

    Ok(ApiResponse::success(response).into_response())
}

#[tracing::instrument(skip(pool))]
async fn create_match(
    State(pool): State<SqlitePool>,
    Json(command): Json<CreateMatchCommand>,
) -> Result<Response, MatchApiError> {
    let record = super::commands::create::handle(pool, command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(record))).into_response())
}

#[tracing::instrument(skip(pool))]
async fn complete_match(
    State(pool): State<SqlitePool>,
    Path(match_id): Path<i64>,
) -> Result<Response, MatchApiError> {
    let tally = super::commands::complete::handle(pool, CompleteMatchCommand { match_id }).await?;
    Ok(ApiResponse::success(tally).into_response())
}

#[tracing::instrument(skip(pool))]
async fn match_tally(
    State(pool): State<SqlitePool>,
    Path(match_id): Path<i64>,
) -> Result<Response, MatchApiError> {
    let tally = super::queries::tally::handle(pool, MatchTallyQuery { match_id }).await?;
    Ok(ApiResponse::success(tally).into_response())
}

#[derive(Debug, thiserror::Error)]
enum MatchApiError {
    #[error(transparent)]
    Record(#[from] RecordMatchResultError),
    #[error(transparent)]
    Create(#[from] CreateMatchError),
    #[error(transparent)]
    Complete(#[from] CompleteMatchError),
    #[error(transparent)]
    Tally(#[from] MatchTallyError),
}

impl IntoResponse for MatchApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            MatchApiError::Record(RecordMatchResultError::InvalidResult(_))
            | MatchApiError::Create(CreateMatchError::SameNetwork) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            },
            MatchApiError::Record(RecordMatchResultError::NotFound(_))
            | MatchApiError::Create(CreateMatchError::TrainingRunNotFound(_))
            | MatchApiError::Create(CreateMatchError::NetworkNotFound(_))
            | MatchApiError::Complete(CompleteMatchError::NotFound(_))
            | MatchApiError::Tally(MatchTallyError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            MatchApiError::Record(RecordMatchResultError::AlreadyDone(_))
            | MatchApiError::Complete(CompleteMatchError::AlreadyDone(_)) => {
                (StatusCode::CONFLICT, "INVALID_STATE")
            },
            MatchApiError::Record(RecordMatchResultError::User(err)) => {
                return users::error_response(err);
            },
            MatchApiError::Record(RecordMatchResultError::Database(_))
            | MatchApiError::Create(CreateMatchError::Database(_))
            | MatchApiError::Complete(CompleteMatchError::Database(_))
            | MatchApiError::Tally(MatchTallyError::Database(_)) => {
                tracing::error!("Database error in match API: {}", self);
                return ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR);
            },
        };

        ErrorResponse::new(code, self.to_string()).into_response_with(status)
    }
}

use crate::api::response::ErrorResponse;
use crate::features::{shared::LenientForm, users, FeatureState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use selfplay_common::protocol::NextGameRequest;

use super::commands::NextGameError;

pub fn work_routes() -> Router<FeatureState> {
    Router::new().route("/next_game", post(next_game))
}

/// `POST /next_game`
///
/// Responds with the bare assignment (`{"type":"train",...}` or
/// `{"type":"match",...}`) rather than the usual envelope; errors use the
/// standard error body. A request with no body and no `Content-Type`
/// counts as an anonymous legacy worker.
#[tracing::instrument(skip(state, request))]
async fn next_game(
    State(state): State<FeatureState>,
    LenientForm(request): LenientForm<NextGameRequest>,
) -> Result<Response, NextGameError> {
    let work = super::commands::next_game::handle(state.db, state.dispatch, request).await?;
    Ok((StatusCode::OK, Json(work)).into_response())
}

impl IntoResponse for NextGameError {
    fn into_response(self) -> Response {
        match &self {
            NextGameError::NoActiveTrainingRun | NextGameError::NoBestNetwork(_) => {
                ErrorResponse::new("NOT_FOUND", self.to_string()).into_response_with(StatusCode::NOT_FOUND)
            },
            NextGameError::User(err) => users::error_response(err),
            NextGameError::Database(_) => {
                tracing::error!("Database error while dispatching work: {}", self);
                ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
                    .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
            },
        }
    }
}

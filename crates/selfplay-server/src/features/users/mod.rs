//! Worker identities
//!
//! There are no user endpoints; other features call [`commands::upsert`] to
//! register or authenticate the worker behind a request.

pub mod commands;

use crate::api::response::ErrorResponse;
use axum::{http::StatusCode, response::Response};

pub use commands::{UpsertUserCommand, UpsertUserError, UserRecord};

/// HTTP rendering shared by every route that authenticates a worker
pub fn error_response(err: &UpsertUserError) -> Response {
    match err {
        UpsertUserError::AuthFailure(_) | UpsertUserError::CredentialsRequired => {
            ErrorResponse::new("UNAUTHORIZED", err.to_string()).into_response_with(StatusCode::UNAUTHORIZED)
        },
        UpsertUserError::UsernameRequired
        | UpsertUserError::UsernameLength
        | UpsertUserError::PasswordRequired => {
            ErrorResponse::new("VALIDATION_ERROR", err.to_string()).into_response_with(StatusCode::BAD_REQUEST)
        },
        UpsertUserError::Database(_) => {
            tracing::error!("Database error while authenticating worker: {}", err);
            ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
                .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        },
    }
}

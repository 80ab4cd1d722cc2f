//! Decide what a worker does next
//!
//! Workers too old to play matches always self-play with the best network.
//! Compatible workers play a game of the oldest open match of the active
//! training run, and self-play when no match is open.

use crate::config::DispatchConfig;
use crate::features::matches::commands::allocate;
use crate::features::matches::queries::find_open;
use crate::features::training_runs::queries::find_active;
use crate::features::users::commands::{upsert, UpsertUserCommand, UpsertUserError};
use selfplay_common::protocol::{Credentials, WorkAssignment};
use crate::db::begin_write;
use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum NextGameError {
    #[error("No active training run")]
    NoActiveTrainingRun,
    #[error("Training run {0} has no best network yet")]
    NoBestNetwork(i64),
    #[error(transparent)]
    User(#[from] UpsertUserError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool, credentials), fields(user = ?credentials.user, version = ?credentials.version))]
pub async fn handle(
    pool: SqlitePool,
    dispatch: DispatchConfig,
    credentials: Credentials,
) -> Result<WorkAssignment, NextGameError> {
    let mut tx = begin_write(&pool).await?;

    let user_id = match UpsertUserCommand::from_credentials(&credentials) {
        Some(user) => Some(upsert(&mut *tx, user).await?.id),
        None => None,
    };

    let run = find_active(&mut *tx)
        .await?
        .ok_or(NextGameError::NoActiveTrainingRun)?;
    let (network_id, sha) = match (run.best_network_id, run.best_network_sha.clone()) {
        (Some(id), Some(sha)) => (id, sha),
        _ => return Err(NextGameError::NoBestNetwork(run.id)),
    };

    // Anonymous callers are legacy workers whatever version they claim
    let compatible = user_id.is_some()
        && credentials
            .version
            .is_some_and(|version| version >= dispatch.min_match_version);

    let params = if !compatible {
        String::new()
    } else {
        if let Some(open) = find_open(&mut *tx, run.id).await? {
            if let Some(game) = allocate(&mut *tx, open.id, user_id).await? {
                tx.commit().await?;
                tracing::info!(match_id = open.id, match_game_id = game.id, "Dispatched match game");
                return Ok(WorkAssignment::Match {
                    match_game_id: game.id,
                    sha: open.current_best_sha,
                    candidate_sha: open.candidate_sha,
                    params: open.parameters,
                    flip: game.flip,
                });
            }
        }
        run.train_parameters.clone()
    };

    tx.commit().await?;

    tracing::info!(training_run_id = run.id, network_id, compatible, "Dispatched self-play game");

    Ok(WorkAssignment::Train {
        training_id: run.id,
        network_id,
        sha,
        params,
    })
}

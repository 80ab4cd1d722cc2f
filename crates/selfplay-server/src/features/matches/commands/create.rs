//! Create a match between a candidate network and the current best network

use super::super::MatchRecord;
use serde::{Deserialize, Serialize};
use crate::db::begin_write;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMatchCommand {
    pub training_run_id: i64,
    pub candidate_id: i64,
    pub current_best_id: i64,
    /// Engine parameters, passed to workers untouched
    #[serde(default)]
    pub parameters: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateMatchError {
    #[error("Candidate and current best must be different networks")]
    SameNetwork,
    #[error("Training run {0} does not exist")]
    TrainingRunNotFound(i64),
    #[error("Network {0} does not exist")]
    NetworkNotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreateMatchCommand {
    pub fn validate(&self) -> Result<(), CreateMatchError> {
        if self.candidate_id == self.current_best_id {
            return Err(CreateMatchError::SameNetwork);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: SqlitePool, command: CreateMatchCommand) -> Result<MatchRecord, CreateMatchError> {
    command.validate()?;

    let mut tx = begin_write(&pool).await?;

    let run: Option<i64> = sqlx::query_scalar("SELECT id FROM training_runs WHERE id = ?1")
        .bind(command.training_run_id)
        .fetch_optional(&mut *tx)
        .await?;
    if run.is_none() {
        return Err(CreateMatchError::TrainingRunNotFound(command.training_run_id));
    }

    for network_id in [command.candidate_id, command.current_best_id] {
        let network: Option<i64> = sqlx::query_scalar("SELECT id FROM networks WHERE id = ?1")
            .bind(network_id)
            .fetch_optional(&mut *tx)
            .await?;
        if network.is_none() {
            return Err(CreateMatchError::NetworkNotFound(network_id));
        }
    }

    let record = sqlx::query_as::<_, MatchRecord>(
        r#"
        INSERT INTO matches (training_run_id, parameters, candidate_id, current_best_id)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id, training_run_id, parameters, candidate_id, current_best_id, done
        "#,
    )
    .bind(command.training_run_id)
    .bind(&command.parameters)
    .bind(command.candidate_id)
    .bind(command.current_best_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(match_id = record.id, "Match created");

    Ok(record)
}

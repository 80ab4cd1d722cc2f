//! Create a training run
//!
//! A newly created active run replaces the previously active one; the
//! coordinator dispatches work for a single active run at a time.

use serde::{Deserialize, Serialize};
use crate::db::begin_write;
use sqlx::SqlitePool;

use super::super::TrainingRunRecord;

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTrainingRunCommand {
    pub description: String,

    /// Parameters handed to compatible workers with train work
    #[serde(default)]
    pub train_parameters: String,

    /// Network to start from; usually set later by the first upload
    #[serde(default)]
    pub best_network_id: Option<i64>,

    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateTrainingRunError {
    #[error("Description is required and cannot be empty")]
    DescriptionRequired,
    #[error("Network {0} does not exist")]
    NetworkNotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreateTrainingRunCommand {
    pub fn validate(&self) -> Result<(), CreateTrainingRunError> {
        if self.description.trim().is_empty() {
            return Err(CreateTrainingRunError::DescriptionRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(description = %command.description, active = command.active))]
pub async fn handle(
    pool: SqlitePool,
    command: CreateTrainingRunCommand,
) -> Result<TrainingRunRecord, CreateTrainingRunError> {
    command.validate()?;

    let mut tx = begin_write(&pool).await?;

    if let Some(network_id) = command.best_network_id {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM networks WHERE id = ?1")
            .bind(network_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(CreateTrainingRunError::NetworkNotFound(network_id));
        }
    }

    if command.active {
        let deactivated = sqlx::query("UPDATE training_runs SET active = 0 WHERE active = 1")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deactivated > 0 {
            tracing::info!("Deactivated previous training run");
        }
    }

    let record = sqlx::query_as::<_, TrainingRunRecord>(
        r#"
        INSERT INTO training_runs (description, train_parameters, best_network_id, active)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id, description, train_parameters, best_network_id, active
        "#,
    )
    .bind(command.description.trim())
    .bind(&command.train_parameters)
    .bind(command.best_network_id)
    .bind(command.active)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(training_run_id = record.id, "Training run created");

    Ok(record)
}

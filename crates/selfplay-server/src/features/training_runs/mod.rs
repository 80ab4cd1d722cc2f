//! Training runs
//!
//! A training run groups the networks, matches and training games of one
//! learning effort. Exactly one run is active; it is the run workers are
//! dispatched against.

pub mod commands;
pub mod queries;
pub mod routes;

use serde::{Deserialize, Serialize};

pub use commands::{
    CreateTrainingRunCommand, CreateTrainingRunError, PromoteNetworkCommand, PromoteNetworkError,
};
pub use queries::{ActiveTrainingRun, GetActiveTrainingRunError};
pub use routes::training_runs_routes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrainingRunRecord {
    pub id: i64,
    pub description: String,
    pub train_parameters: String,
    pub best_network_id: Option<i64>,
    pub active: bool,
}

//! Feature slices of the coordinator
//!
//! Each feature is a vertical slice with its own commands, queries and
//! routes:
//!
//! - **work**: `POST /next_game`, the train-or-match dispatcher
//! - **networks**: network upload/download and training-game uploads
//! - **matches**: match creation, game results, completion and tallies
//! - **training_runs**: training run creation, active run, promotion
//! - **users**: worker registration and authentication (no routes)
//!
//! Worker-facing routes keep the paths the worker protocol defines and are
//! mounted at the root. Operator routes live under `/api/v1`.

pub mod matches;
pub mod networks;
pub mod shared;
pub mod training_runs;
pub mod users;
pub mod work;

use crate::config::DispatchConfig;
use crate::storage::SharedBlobStore;
use axum::Router;
use matches::CompletionPolicy;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub db: SqlitePool,
    pub blobs: SharedBlobStore,
    pub dispatch: DispatchConfig,
    /// Consulted after every recorded match game
    pub completion: Arc<dyn CompletionPolicy>,
}

impl FeatureState {
    pub fn new(db: SqlitePool, blobs: SharedBlobStore, dispatch: DispatchConfig) -> Self {
        Self {
            db,
            blobs,
            dispatch,
            completion: matches::policy::from_config(&dispatch),
        }
    }

    pub fn with_completion(mut self, completion: Arc<dyn CompletionPolicy>) -> Self {
        self.completion = completion;
        self
    }
}

/// Worker protocol routes, mounted at the root
pub fn protocol_router(state: FeatureState) -> Router<()> {
    Router::new()
        .merge(work::work_routes())
        .merge(networks::networks_routes())
        .merge(matches::match_result_routes())
        .with_state(state)
}

/// Operator routes, mounted under `/api/v1`
pub fn admin_router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest(
            "/training-runs",
            training_runs::training_runs_routes().with_state(state.db.clone()),
        )
        .nest("/matches", matches::matches_routes().with_state(state.db))
}

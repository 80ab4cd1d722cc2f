//! Match lifecycle
//!
//! Matches pit a candidate network against the current best network. Games
//! are allocated to workers one at a time, results flow back per game, and a
//! [`policy::CompletionPolicy`] (or the operator) decides when the match is
//! done.

pub mod commands;
pub mod policy;
pub mod queries;
pub mod routes;

use serde::{Deserialize, Serialize};

pub use commands::{
    AllocatedGame, CompleteMatchCommand, CompleteMatchError, CreateMatchCommand, CreateMatchError,
    RecordMatchResultCommand, RecordMatchResultError, RecordMatchResultResponse,
};
pub use policy::{CompletionPolicy, FixedGameCount, ManualCompletion};
pub use queries::{MatchTally, MatchTallyError, MatchTallyQuery, OpenMatch};
pub use routes::{match_result_routes, matches_routes};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchRecord {
    pub id: i64,
    pub training_run_id: i64,
    pub parameters: String,
    pub candidate_id: i64,
    pub current_best_id: i64,
    pub done: bool,
}

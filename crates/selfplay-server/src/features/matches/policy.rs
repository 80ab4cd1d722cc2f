//! When is a match finished?
//!
//! After every recorded game the match's tally is offered to a
//! [`CompletionPolicy`]. A policy that answers `true` closes the match and no
//! further games are allocated for it.

use super::queries::MatchTally;
use crate::config::DispatchConfig;
use std::sync::Arc;

pub trait CompletionPolicy: Send + Sync {
    fn should_complete(&self, tally: &MatchTally) -> bool;
}

/// Never completes; the operator closes matches through the admin route
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualCompletion;

impl CompletionPolicy for ManualCompletion {
    fn should_complete(&self, _tally: &MatchTally) -> bool {
        false
    }
}

/// Completes once a fixed number of games has finished
#[derive(Debug, Clone, Copy)]
pub struct FixedGameCount(pub u32);

impl CompletionPolicy for FixedGameCount {
    fn should_complete(&self, tally: &MatchTally) -> bool {
        tally.finished() >= i64::from(self.0)
    }
}

/// Policy selected by configuration, `match_games = 0` meaning manual
pub fn from_config(config: &DispatchConfig) -> Arc<dyn CompletionPolicy> {
    match config.match_games {
        0 => Arc::new(ManualCompletion),
        games => Arc::new(FixedGameCount(games)),
    }
}

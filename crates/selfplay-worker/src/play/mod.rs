//! Running assigned work on the engine
//!
//! - **train**: one self-play game producing a training-data file
//! - **match**: one game between the current best and a candidate network

pub mod match_game;
pub mod train;

pub use match_game::{play_match, GameLimits, GameRecord, MatchOutcome, MatchSetup, Side, Termination};
pub use train::{run_selfplay, SelfPlayGame};

/// Split the coordinator's opaque parameter string into engine arguments
///
/// The usual form is a JSON array of strings such as `["--visits 10"]`;
/// every element is split on whitespace. Anything that is not such an array
/// is split on whitespace as a whole.
pub fn parse_params(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(items) => items
            .iter()
            .flat_map(|item| item.split_whitespace())
            .map(str::to_string)
            .collect(),
        Err(_) => raw.split_whitespace().map(str::to_string).collect(),
    }
}

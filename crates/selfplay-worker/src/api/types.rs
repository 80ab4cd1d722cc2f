//! Coordinator response envelopes
//!
//! Work assignments and request bodies are shared with the coordinator
//! through `selfplay_common::protocol`; only the JSON wrappers live here.

use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

/// Body returned with every non-success status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// `POST /upload_game` acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameUploaded {
    pub training_game_id: i64,
    pub games_played: i64,
}

/// `POST /match_result` acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResultRecorded {
    pub match_game_id: i64,
    pub match_id: i64,
    pub match_done: bool,
}

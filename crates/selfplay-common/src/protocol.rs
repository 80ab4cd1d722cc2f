//! Wire schemas exchanged between workers and the coordinator
//!
//! Requests are form encoded (`application/x-www-form-urlencoded` or
//! multipart for uploads); responses are JSON. Field names are part of the
//! protocol and must not change without bumping [`CLIENT_VERSION`].

use crate::error::SelfplayError;
use serde::{Deserialize, Serialize};

/// Protocol version spoken by this worker build.
pub const CLIENT_VERSION: u32 = 2;

/// Oldest worker protocol version that may be handed match work.
pub const MIN_MATCH_VERSION: u32 = 2;

/// Multipart field names used by upload endpoints.
pub mod fields {
    pub const USER: &str = "user";
    pub const PASSWORD: &str = "password";
    pub const VERSION: &str = "version";
    pub const TRAINING_ID: &str = "training_id";
    pub const NETWORK_ID: &str = "network_id";
    pub const LAYERS: &str = "layers";
    pub const FILTERS: &str = "filters";
    pub const PGN: &str = "pgn";
    pub const FILE: &str = "file";
}

/// Worker credentials sent with every request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            password: Some(password.into()),
            version: Some(CLIENT_VERSION),
        }
    }

    /// Whether the request carried an identity at all
    pub fn is_anonymous(&self) -> bool {
        self.user.as_deref().map_or(true, |u| u.trim().is_empty())
    }
}

/// `POST /next_game` form body
pub type NextGameRequest = Credentials;

/// Work handed to a worker by `POST /next_game`
///
/// Serialized with an internal `type` tag so the JSON reads
/// `{"type":"train",...}` or `{"type":"match",...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkAssignment {
    #[serde(rename_all = "camelCase")]
    Train {
        training_id: i64,
        network_id: i64,
        /// Hash of the network to self-play with
        sha: String,
        params: String,
    },
    #[serde(rename_all = "camelCase")]
    Match {
        match_game_id: i64,
        /// Hash of the current best network
        sha: String,
        candidate_sha: String,
        params: String,
        /// `false`: current best plays first. `true`: candidate plays first.
        /// Omitted from the wire when `false`.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        flip: bool,
    },
}

impl WorkAssignment {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkAssignment::Train { .. } => "train",
            WorkAssignment::Match { .. } => "match",
        }
    }
}

/// Outcome of a match game, from the candidate network's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    CandidateLoss,
    Draw,
    CandidateWin,
}

impl GameResult {
    pub fn as_i64(self) -> i64 {
        match self {
            GameResult::CandidateLoss => -1,
            GameResult::Draw => 0,
            GameResult::CandidateWin => 1,
        }
    }
}

impl TryFrom<i64> for GameResult {
    type Error = SelfplayError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(GameResult::CandidateLoss),
            0 => Ok(GameResult::Draw),
            1 => Ok(GameResult::CandidateWin),
            other => Err(SelfplayError::InvalidResult(other)),
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// `POST /match_result` form body
///
/// Credential fields are inlined rather than flattened: urlencoded bodies
/// lose their number parsing through `#[serde(flatten)]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResultRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    pub match_game_id: i64,
    pub result: i64,
    #[serde(default)]
    pub pgn: String,
}

impl MatchResultRequest {
    pub fn new(credentials: &Credentials, match_game_id: i64, result: GameResult, pgn: String) -> Self {
        Self {
            user: credentials.user.clone(),
            password: credentials.password.clone(),
            version: credentials.version,
            match_game_id,
            result: result.as_i64(),
            pgn,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            user: self.user.clone(),
            password: self.password.clone(),
            version: self.version,
        }
    }
}

/// Body of a successful `POST /upload_network`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadNetworkResponse {
    pub network_id: i64,
    pub sha: String,
}

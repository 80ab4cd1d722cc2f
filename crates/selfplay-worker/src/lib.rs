//! Selfplay Worker Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! A worker repeatedly asks the coordinator for work, runs it on an external
//! engine and reports the outcome:
//!
//! - **train**: self-play one game with the current best network and upload
//!   the training data it produced
//! - **match**: play one game between the current best network and a
//!   candidate over UCI and report the result for the candidate
//!
//! Failed cycles are retried after an exponential backoff; the worker runs
//! until it is interrupted.

pub mod api;
pub mod backoff;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod play;

// Re-export commonly used types
pub use config::WorkerConfig;
pub use error::{Result, WorkerError};
pub use orchestrator::Worker;

use api::client::{DEFAULT_API_TIMEOUT_SECS, DEFAULT_SERVER_URL};
use backoff::{DEFAULT_BACKOFF_BASE_SECS, DEFAULT_BACKOFF_JITTER_SECS, DEFAULT_BACKOFF_MAX_SECS};
use clap::Parser;
use play::match_game::DEFAULT_MAX_PLIES;
use std::path::PathBuf;

/// Selfplay worker - generates training games and plays evaluation matches
#[derive(Parser, Debug)]
#[command(name = "selfplay-worker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Coordinator URL
    #[arg(long, env = "SELFPLAY_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// Username
    #[arg(short, long, env = "SELFPLAY_USER")]
    pub user: String,

    /// Password
    #[arg(short, long, env = "SELFPLAY_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// ID of the OpenCL device to use (-1 for no GPU)
    #[arg(long, env = "SELFPLAY_GPU", default_value_t = 0, allow_negative_numbers = true)]
    pub gpu: i32,

    /// Engine executable
    #[arg(long, env = "SELFPLAY_ENGINE", default_value = "./lczero")]
    pub engine: String,

    /// Argument placed before all others on the engine command line (repeatable)
    #[arg(long = "engine-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Directory engines run in and networks are cached under
    #[arg(long, env = "SELFPLAY_WORK_DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Name of the self-play data directory (defaults to the process id)
    #[arg(long, env = "SELFPLAY_TRAIN_TAG")]
    pub train_tag: Option<String>,

    /// First retry delay after a failed cycle
    #[arg(long, env = "SELFPLAY_BACKOFF_BASE_SECS", default_value_t = DEFAULT_BACKOFF_BASE_SECS)]
    pub backoff_base_secs: u64,

    /// Longest retry delay
    #[arg(long, env = "SELFPLAY_BACKOFF_MAX_SECS", default_value_t = DEFAULT_BACKOFF_MAX_SECS)]
    pub backoff_max_secs: u64,

    /// Random slack added to every retry delay
    #[arg(long, env = "SELFPLAY_BACKOFF_JITTER_SECS", default_value_t = DEFAULT_BACKOFF_JITTER_SECS)]
    pub backoff_jitter_secs: u64,

    /// Timeout for each coordinator request
    #[arg(long, env = "SELFPLAY_HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_API_TIMEOUT_SECS)]
    pub http_timeout_secs: u64,

    /// Plies after which a match game is drawn
    #[arg(long, env = "SELFPLAY_MAX_PLIES", default_value_t = DEFAULT_MAX_PLIES)]
    pub max_plies: u32,

    /// Fail a match game when an engine stays silent this long
    #[arg(long, env = "SELFPLAY_MOVE_TIMEOUT_SECS")]
    pub move_timeout_secs: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

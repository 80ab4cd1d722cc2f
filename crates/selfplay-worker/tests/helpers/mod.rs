//! Shared setup for worker integration tests

#![allow(dead_code)]

use selfplay_common::{codec, digest, protocol::Credentials};
use selfplay_worker::backoff::BackoffConfig;
use selfplay_worker::engine::{EngineCommand, NO_GPU};
use selfplay_worker::play::GameLimits;
use selfplay_worker::WorkerConfig;
use std::path::Path;
use std::time::Duration;

/// Worker config pointed at `server_url` that runs `sh -c <script>` as engine
pub fn config(server_url: &str, work_dir: &Path, script: &str) -> WorkerConfig {
    WorkerConfig {
        server_url: server_url.to_string(),
        credentials: Credentials::new("alice", "secret"),
        gpu: NO_GPU,
        engine: EngineCommand::new("sh").with_args(["-c", script, "engine"]),
        work_dir: work_dir.to_path_buf(),
        train_tag: "t1".to_string(),
        backoff: BackoffConfig {
            base: Duration::from_secs(30),
            max: Duration::from_secs(300),
            jitter: Duration::ZERO,
        },
        http_timeout: Duration::from_secs(10),
        limits: GameLimits {
            max_plies: 40,
            move_timeout: Some(Duration::from_secs(10)),
        },
    }
}

/// `(sha, gzip bytes)` of a network with the given weights
pub fn network(weights: &[u8]) -> (String, Vec<u8>) {
    (digest::sha256_hex(weights), codec::gzip(weights).unwrap())
}

pub fn body_text(request: &wiremock::Request) -> String {
    String::from_utf8_lossy(&request.body).into_owned()
}

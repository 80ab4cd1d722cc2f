//! Worker configuration
//!
//! Built once from the command line at startup and passed by reference to
//! everything that needs it; nothing mutates it afterwards.

use crate::backoff::BackoffConfig;
use crate::engine::EngineCommand;
use crate::error::{Result, WorkerError};
use crate::play::GameLimits;
use crate::Cli;
use selfplay_common::protocol::Credentials;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub server_url: String,
    pub credentials: Credentials,
    /// OpenCL device, negative for none
    pub gpu: i32,
    pub engine: EngineCommand,
    /// Engines run here; networks are cached under `networks/`
    pub work_dir: PathBuf,
    /// Names the `data-<tag>` directory of self-play runs
    pub train_tag: String,
    pub backoff: BackoffConfig,
    pub http_timeout: Duration,
    pub limits: GameLimits,
}

impl WorkerConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let work_dir = absolute(&cli.work_dir)?;

        // A relative program path must survive the engine running in work_dir
        let program = PathBuf::from(&cli.engine);
        let program = if program.components().count() > 1 {
            absolute(&program)?
        } else {
            program
        };

        let config = Self {
            server_url: cli.server_url.trim_end_matches('/').to_string(),
            credentials: Credentials::new(cli.user.trim(), cli.password.clone()),
            gpu: cli.gpu,
            engine: EngineCommand::new(program).with_args(cli.engine_args.iter().cloned()),
            work_dir,
            train_tag: cli
                .train_tag
                .clone()
                .unwrap_or_else(|| std::process::id().to_string()),
            backoff: BackoffConfig {
                base: Duration::from_secs(cli.backoff_base_secs),
                max: Duration::from_secs(cli.backoff_max_secs),
                jitter: Duration::from_secs(cli.backoff_jitter_secs),
            },
            http_timeout: Duration::from_secs(cli.http_timeout_secs),
            limits: GameLimits {
                max_plies: cli.max_plies,
                move_timeout: cli.move_timeout_secs.map(Duration::from_secs),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.credentials.is_anonymous() {
            return Err(WorkerError::config("You must specify a username"));
        }
        if self.credentials.password.as_deref().map_or(true, str::is_empty) {
            return Err(WorkerError::config("You must specify a non-empty password"));
        }
        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(WorkerError::config(format!(
                "Server URL must start with http:// or https://, got '{}'",
                self.server_url
            )));
        }
        if self.engine.program.as_os_str().is_empty() {
            return Err(WorkerError::config("Engine program cannot be empty"));
        }
        if self.train_tag.is_empty() || self.train_tag.contains(['/', '\\']) {
            return Err(WorkerError::config("Train tag must be a plain, non-empty name"));
        }
        if self.backoff.base.is_zero() {
            return Err(WorkerError::config("Backoff base interval must be greater than 0"));
        }
        if self.backoff.max < self.backoff.base {
            return Err(WorkerError::config("Backoff ceiling cannot be below the base interval"));
        }
        if self.http_timeout.is_zero() {
            return Err(WorkerError::config("HTTP timeout must be greater than 0"));
        }
        if self.limits.max_plies == 0 {
            return Err(WorkerError::config("Ply limit must be greater than 0"));
        }
        Ok(())
    }

    pub fn networks_dir(&self) -> PathBuf {
        self.work_dir.join("networks")
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| WorkerError::config(format!("Cannot resolve '{}': {}", path.display(), e)))
}

/// Config for tests: runs `sh -c <script>` as the engine inside `work_dir`
#[cfg(test)]
pub(crate) fn test_config(work_dir: &Path, script: &str) -> WorkerConfig {
    WorkerConfig {
        server_url: "http://localhost:8080".to_string(),
        credentials: Credentials::new("default", "1234"),
        gpu: crate::engine::NO_GPU,
        engine: EngineCommand::new("sh").with_args(["-c", script, "engine"]),
        work_dir: work_dir.to_path_buf(),
        train_tag: "t1".to_string(),
        backoff: BackoffConfig::default(),
        http_timeout: Duration::from_secs(30),
        limits: GameLimits {
            max_plies: 450,
            move_timeout: Some(Duration::from_secs(10)),
        },
    }
}

//! Worker control loop
//!
//! One cycle is Idle → RequestingWork → FetchingArtifacts → Running →
//! Reporting → Idle. Any failure sends the loop through Backoff before the
//! next cycle. The cancellation token is checked at every transition and
//! interrupts the backoff sleep.

use crate::api::{ApiClient, GameUpload};
use crate::backoff::Backoff;
use crate::cache::NetworkCache;
use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::play::{self, MatchSetup};
use selfplay_common::protocol::{GameResult, MatchResultRequest, WorkAssignment};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    RequestingWork,
    FetchingArtifacts,
    Running,
    Reporting,
    Backoff,
}

impl std::fmt::Display for CycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CycleState::Idle => "idle",
            CycleState::RequestingWork => "requesting-work",
            CycleState::FetchingArtifacts => "fetching-artifacts",
            CycleState::Running => "running",
            CycleState::Reporting => "reporting",
            CycleState::Backoff => "backoff",
        };
        f.write_str(name)
    }
}

/// What a successful cycle reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    Trained {
        network_id: i64,
        training_game_id: i64,
        games_played: i64,
    },
    Matched {
        match_game_id: i64,
        result: GameResult,
        match_done: bool,
    },
}

pub struct Worker {
    config: WorkerConfig,
    client: ApiClient,
    cache: NetworkCache,
    backoff: Backoff,
    cancel: CancellationToken,
}

impl Worker {
    pub fn new(config: WorkerConfig, cancel: CancellationToken) -> Result<Self> {
        let client = ApiClient::new(
            config.server_url.clone(),
            config.credentials.clone(),
            config.http_timeout,
        )?;
        let cache = NetworkCache::new(config.networks_dir());
        let backoff = Backoff::new(config.backoff);

        Ok(Self {
            config,
            client,
            cache,
            backoff,
            cancel,
        })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run cycles until cancelled
    pub async fn run(&mut self) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        tracing::info!(
            server = %self.config.server_url,
            work_dir = %self.config.work_dir.display(),
            "Worker started"
        );

        loop {
            match self.run_cycle().await {
                Ok(report) => {
                    self.backoff.reset();
                    tracing::info!(?report, "Cycle complete");
                },
                Err(WorkerError::Cancelled) => break,
                Err(e) => {
                    let delay = self.backoff.next_delay();
                    tracing::warn!(
                        error = %e,
                        failures = self.backoff.failures(),
                        delay_secs = delay.as_secs_f64(),
                        "Cycle failed, backing off"
                    );
                    if self.sleep(delay).await.is_err() {
                        break;
                    }
                },
            }
        }

        tracing::info!("Worker stopped");
        Ok(())
    }

    /// Request one piece of work, run it and report it
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.enter(CycleState::Idle)?;
        self.enter(CycleState::RequestingWork)?;
        let work = self.client.next_game().await?;
        tracing::info!(kind = work.kind(), "Received work");

        match work {
            WorkAssignment::Train {
                training_id,
                network_id,
                sha,
                params,
            } => self.train(training_id, network_id, &sha, &params).await,
            WorkAssignment::Match {
                match_game_id,
                sha,
                candidate_sha,
                params,
                flip,
            } => {
                self.play_match(match_game_id, sha, candidate_sha, &params, flip)
                    .await
            },
        }
    }

    async fn train(
        &self,
        training_id: i64,
        network_id: i64,
        sha: &str,
        params: &str,
    ) -> Result<CycleReport> {
        self.enter(CycleState::FetchingArtifacts)?;
        let weights = self.cache.get_single(&self.client, sha).await?;

        self.enter(CycleState::Running)?;
        let game =
            play::run_selfplay(&self.config, &weights, &play::parse_params(params), &self.cancel).await?;

        self.enter(CycleState::Reporting)?;
        let uploaded = self
            .client
            .upload_game(&GameUpload {
                training_id,
                network_id,
                pgn: game.pgn,
                data_path: game.data_path,
            })
            .await?;

        Ok(CycleReport::Trained {
            network_id,
            training_game_id: uploaded.training_game_id,
            games_played: uploaded.games_played,
        })
    }

    async fn play_match(
        &self,
        match_game_id: i64,
        best_sha: String,
        candidate_sha: String,
        params: &str,
        flip: bool,
    ) -> Result<CycleReport> {
        self.enter(CycleState::FetchingArtifacts)?;
        let (best_weights, candidate_weights) = self
            .cache
            .get_pair(&self.client, &best_sha, &candidate_sha)
            .await?;

        self.enter(CycleState::Running)?;
        let setup = MatchSetup {
            match_game_id,
            best_sha,
            best_weights,
            candidate_sha,
            candidate_weights,
            params: play::parse_params(params),
            flip,
        };
        let outcome = play::play_match(&self.config, &setup, &self.cancel).await?;

        self.enter(CycleState::Reporting)?;
        let request = MatchResultRequest::new(
            self.client.credentials(),
            match_game_id,
            outcome.result,
            outcome.pgn,
        );
        let recorded = self.client.match_result(&request).await?;

        Ok(CycleReport::Matched {
            match_game_id,
            result: outcome.result,
            match_done: recorded.match_done,
        })
    }

    fn enter(&self, state: CycleState) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(WorkerError::Cancelled);
        }
        tracing::debug!(%state, "Worker state");
        Ok(())
    }

    /// Sleep through a backoff period unless cancelled first
    async fn sleep(&self, delay: Duration) -> Result<()> {
        self.enter(CycleState::Backoff)?;
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = self.cancel.cancelled() => Err(WorkerError::Cancelled),
        }
    }
}

//! Self-play training game

use crate::config::WorkerConfig;
use crate::engine::EngineProcess;
use crate::error::{Result, WorkerError};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Games requested from the engine per train assignment
pub const GAMES_PER_RUN: u32 = 1;

/// Output of one self-play run
#[derive(Debug, Clone)]
pub struct SelfPlayGame {
    /// Gzip-compressed training data written by the engine
    pub data_path: PathBuf,
    pub pgn: String,
}

/// Directory the engine writes training data into
pub fn data_dir(work_dir: &Path, tag: &str) -> PathBuf {
    work_dir.join(format!("data-{}", tag))
}

/// The engine reads the whole flag as one argument
pub fn start_flag(tag: &str, games: u32) -> String {
    format!("--start=train {} {}", tag, games)
}

/// Play one self-play game with `weights` and collect what it produced
#[tracing::instrument(skip_all, fields(tag = %config.train_tag))]
pub async fn run_selfplay(
    config: &WorkerConfig,
    weights: &Path,
    params: &[String],
    cancel: &CancellationToken,
) -> Result<SelfPlayGame> {
    let data_dir = data_dir(&config.work_dir, &config.train_tag);
    if data_dir.exists() {
        tracing::info!(dir = %data_dir.display(), "Removing previous training data");
        tokio::fs::remove_dir_all(&data_dir).await?;
    }

    let mut extra = params.to_vec();
    extra.push(start_flag(&config.train_tag, GAMES_PER_RUN));
    let args = config.engine.build_args(weights, config.gpu, &extra);

    let engine = EngineProcess::spawn("selfplay", &config.engine.program, &args, &config.work_dir)?;

    // Dropping the wait future kills the engine
    let exit = tokio::select! {
        exit = engine.wait() => exit?,
        _ = cancel.cancelled() => return Err(WorkerError::Cancelled),
    };

    let data_path = data_dir.join("training.0.gz");
    if !data_path.is_file() {
        return Err(WorkerError::process(format!(
            "Engine finished without writing {}",
            data_path.display()
        )));
    }

    if exit.transcript.is_empty() {
        tracing::warn!("Engine printed no game transcript");
    }

    Ok(SelfPlayGame {
        data_path,
        pgn: exit.transcript,
    })
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::test_config;

    const SELFPLAY_SCRIPT: &str = r#"
case "$*" in
  *"--start=train t1 1"*) ;;
  *) echo "unexpected arguments: $*" >&2; exit 2 ;;
esac
mkdir -p data-t1
printf 'training data' > data-t1/training.0.gz
echo "info string selfplay starting"
echo PGN
echo '[Result "1-0"]'
echo ''
echo '1. e4 e5 1-0'
echo END
"#;

    #[test]
    fn test_start_flag() {
        assert_eq!(start_flag("42", 1), "--start=train 42 1");
        assert_eq!(data_dir(Path::new("/work"), "42"), PathBuf::from("/work/data-42"));
    }

    #[tokio::test]
    async fn test_selfplay_collects_data_and_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), SELFPLAY_SCRIPT);
        std::fs::create_dir_all(data_dir(dir.path(), "t1")).unwrap();
        std::fs::write(data_dir(dir.path(), "t1").join("stale.gz"), b"old").unwrap();

        let game = run_selfplay(&config, Path::new("networks/abcd"), &[], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&game.data_path).unwrap(), b"training data");
        assert_eq!(game.pgn, "[Result \"1-0\"]\n\n1. e4 e5 1-0\n");
        assert!(!data_dir(dir.path(), "t1").join("stale.gz").exists());
    }

    #[tokio::test]
    async fn test_missing_training_data_is_process_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), "echo PGN; echo END");

        let err = run_selfplay(&config, Path::new("w"), &[], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::Process(_)));
    }

    #[tokio::test]
    async fn test_cancellation_stops_a_running_engine() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), "sleep 30");
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            run_selfplay(&config, Path::new("w"), &[], &cancel),
        )
        .await
        .unwrap();

        assert!(matches!(result, Err(WorkerError::Cancelled)));
    }
}

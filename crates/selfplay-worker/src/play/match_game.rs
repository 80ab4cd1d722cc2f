//! Match game between the current best network and a candidate
//!
//! Both engines speak UCI. Each is brought up with `uci`/`isready`/
//! `ucinewgame`, then the side to move gets `position startpos moves ...`
//! and `go` until it answers `bestmove`. A side without a legal move is
//! checkmated when its last reported score was a mate against it, and
//! stalemated otherwise. Games reaching the ply limit are drawn.

use crate::config::WorkerConfig;
use crate::engine::uci::{self, EngineMessage, Score};
use crate::engine::EngineProcess;
use crate::error::{Result, WorkerError};
use chrono::NaiveDate;
use selfplay_common::protocol::GameResult;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default number of plies after which a game is declared drawn.
pub const DEFAULT_MAX_PLIES: u32 = 450;

/// Bound on engine startup when no move timeout is configured
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameLimits {
    pub max_plies: u32,
    /// Longest silence tolerated from an engine; `None` waits forever
    pub move_timeout: Option<Duration>,
}

impl Default for GameLimits {
    fn default() -> Self {
        Self {
            max_plies: DEFAULT_MAX_PLIES,
            move_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    fn to_move(ply: usize) -> Self {
        if ply % 2 == 0 {
            Side::White
        } else {
            Side::Black
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Checkmate { winner: Side },
    Stalemate,
    PlyLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    /// Moves in coordinate notation, white first
    pub moves: Vec<String>,
    pub termination: Termination,
}

impl GameRecord {
    pub fn winner(&self) -> Option<Side> {
        match self.termination {
            Termination::Checkmate { winner } => Some(winner),
            Termination::Stalemate | Termination::PlyLimit => None,
        }
    }

    pub fn result_tag(&self) -> &'static str {
        match self.winner() {
            Some(Side::White) => "1-0",
            Some(Side::Black) => "0-1",
            None => "1/2-1/2",
        }
    }
}

/// Everything needed to play one assigned match game
#[derive(Debug, Clone)]
pub struct MatchSetup {
    pub match_game_id: i64,
    pub best_sha: String,
    pub best_weights: PathBuf,
    pub candidate_sha: String,
    pub candidate_weights: PathBuf,
    pub params: Vec<String>,
    /// `false`: current best plays white
    pub flip: bool,
}

impl MatchSetup {
    pub fn candidate_side(&self) -> Side {
        if self.flip {
            Side::White
        } else {
            Side::Black
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// From the candidate's point of view
    pub result: GameResult,
    pub pgn: String,
    pub record: GameRecord,
}

/// Play one match game and score it for the candidate
#[tracing::instrument(skip_all, fields(match_game_id = setup.match_game_id, flip = setup.flip))]
pub async fn play_match(
    config: &WorkerConfig,
    setup: &MatchSetup,
    cancel: &CancellationToken,
) -> Result<MatchOutcome> {
    let limits = config.limits;

    let best_args = config
        .engine
        .build_args(&setup.best_weights, config.gpu, &setup.params);
    let mut best = EngineProcess::spawn("best", &config.engine.program, &best_args, &config.work_dir)?;

    let candidate_args = config
        .engine
        .build_args(&setup.candidate_weights, config.gpu, &setup.params);
    let mut candidate = EngineProcess::spawn(
        "candidate",
        &config.engine.program,
        &candidate_args,
        &config.work_dir,
    )?;

    let record = match run_game(&mut best, &mut candidate, setup.flip, &limits, cancel).await {
        Ok(record) => record,
        Err(e) => {
            best.kill().await;
            candidate.kill().await;
            return Err(e);
        },
    };

    shutdown(best).await;
    shutdown(candidate).await;

    let result = match record.winner() {
        None => GameResult::Draw,
        Some(side) if side == setup.candidate_side() => GameResult::CandidateWin,
        Some(_) => GameResult::CandidateLoss,
    };

    let (white_sha, black_sha) = if setup.flip {
        (&setup.candidate_sha, &setup.best_sha)
    } else {
        (&setup.best_sha, &setup.candidate_sha)
    };
    let pgn = format_pgn(
        white_sha,
        black_sha,
        setup.match_game_id,
        chrono::Local::now().date_naive(),
        &record,
    );

    tracing::info!(
        plies = record.moves.len(),
        result = %result,
        termination = ?record.termination,
        "Match game finished"
    );

    Ok(MatchOutcome { result, pgn, record })
}

async fn run_game(
    best: &mut EngineProcess,
    candidate: &mut EngineProcess,
    flip: bool,
    limits: &GameLimits,
    cancel: &CancellationToken,
) -> Result<GameRecord> {
    handshake(best, limits, cancel).await?;
    handshake(candidate, limits, cancel).await?;

    let (white, black) = if flip { (candidate, best) } else { (best, candidate) };
    play_game(white, black, limits, cancel).await
}

/// Bring an engine to the point where it accepts a game
///
/// Each reply is awaited for at most the move timeout, or
/// [`HANDSHAKE_TIMEOUT`] when none is set.
pub async fn handshake(engine: &mut EngineProcess, limits: &GameLimits, cancel: &CancellationToken) -> Result<()> {
    let timeout = Some(limits.move_timeout.unwrap_or(HANDSHAKE_TIMEOUT));
    let ready = async {
        engine.send_line("uci").await?;
        expect(engine, timeout, EngineMessage::UciOk).await?;
        engine.send_line("isready").await?;
        expect(engine, timeout, EngineMessage::ReadyOk).await?;
        engine.send_line("ucinewgame").await
    };

    tokio::select! {
        result = ready => result,
        _ = cancel.cancelled() => Err(WorkerError::Cancelled),
    }
}

async fn expect(engine: &mut EngineProcess, timeout: Option<Duration>, wanted: EngineMessage) -> Result<()> {
    loop {
        let line = engine.next_line(timeout).await?;
        if uci::parse_line(&line) == wanted {
            return Ok(());
        }
    }
}

/// Alternate moves between `white` and `black` until the game ends
pub async fn play_game(
    white: &mut EngineProcess,
    black: &mut EngineProcess,
    limits: &GameLimits,
    cancel: &CancellationToken,
) -> Result<GameRecord> {
    let mut moves: Vec<String> = Vec::new();

    loop {
        if cancel.is_cancelled() {
            return Err(WorkerError::Cancelled);
        }
        if moves.len() >= limits.max_plies as usize {
            return Ok(GameRecord {
                moves,
                termination: Termination::PlyLimit,
            });
        }

        let side = Side::to_move(moves.len());
        let engine: &mut EngineProcess = match side {
            Side::White => &mut *white,
            Side::Black => &mut *black,
        };

        engine.send_line(&position_command(&moves)).await?;
        engine.send_line("go").await?;

        let (best_move, score) = tokio::select! {
            answer = search(engine, limits) => answer?,
            _ = cancel.cancelled() => return Err(WorkerError::Cancelled),
        };

        match best_move {
            Some(mv) => moves.push(mv),
            None => {
                let termination = if score.is_some_and(Score::is_mated) {
                    Termination::Checkmate {
                        winner: side.opponent(),
                    }
                } else {
                    Termination::Stalemate
                };
                return Ok(GameRecord { moves, termination });
            },
        }
    }
}

/// Read until `bestmove`, keeping the last score seen on the way
async fn search(engine: &mut EngineProcess, limits: &GameLimits) -> Result<(Option<String>, Option<Score>)> {
    let mut score = None;
    loop {
        let line = engine.next_line(limits.move_timeout).await?;
        match uci::parse_line(&line) {
            EngineMessage::Info(Some(s)) => score = Some(s),
            EngineMessage::BestMove(mv) => return Ok((mv, score)),
            _ => {},
        }
    }
}

pub fn position_command(moves: &[String]) -> String {
    if moves.is_empty() {
        "position startpos".to_string()
    } else {
        format!("position startpos moves {}", moves.join(" "))
    }
}

async fn shutdown(mut engine: EngineProcess) {
    let label = engine.label().to_string();
    if let Err(e) = engine.send_line("quit").await {
        tracing::warn!(engine = %label, error = %e, "Engine gone before quit");
    }
    if let Err(e) = engine.wait().await {
        tracing::warn!(engine = %label, error = %e, "Engine did not shut down cleanly");
    }
}

/// Render a finished game as PGN with coordinate-notation moves
pub fn format_pgn(white: &str, black: &str, round: i64, date: NaiveDate, record: &GameRecord) -> String {
    let result = record.result_tag();
    let mut pgn = String::new();
    pgn.push_str("[Event \"Selfplay match\"]\n");
    pgn.push_str("[Site \"selfplay-worker\"]\n");
    pgn.push_str(&format!("[Date \"{}\"]\n", date.format("%Y.%m.%d")));
    pgn.push_str(&format!("[Round \"{}\"]\n", round));
    pgn.push_str(&format!("[White \"{}\"]\n", white));
    pgn.push_str(&format!("[Black \"{}\"]\n", black));
    pgn.push_str(&format!("[Result \"{}\"]\n", result));
    pgn.push_str(&format!("[PlyCount \"{}\"]\n", record.moves.len()));
    pgn.push('\n');

    let mut movetext: Vec<String> = Vec::with_capacity(record.moves.len() + record.moves.len() / 2 + 1);
    for (ply, mv) in record.moves.iter().enumerate() {
        if ply % 2 == 0 {
            movetext.push(format!("{}.", ply / 2 + 1));
        }
        movetext.push(mv.clone());
    }
    movetext.push(result.to_string());
    pgn.push_str(&movetext.join(" "));
    pgn.push('\n');
    pgn
}

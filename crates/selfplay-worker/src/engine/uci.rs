//! Parsing of the UCI engine responses the match driver cares about

/// Evaluation reported in an `info` line, from the side to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Mate in N moves; zero or negative means the side to move is mated
    Mate(i32),
}

impl Score {
    pub fn is_mated(self) -> bool {
        matches!(self, Score::Mate(n) if n <= 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    UciOk,
    ReadyOk,
    /// `None` for `bestmove (none)` and `bestmove 0000`
    BestMove(Option<String>),
    Info(Option<Score>),
    Other,
}

pub fn parse_line(line: &str) -> EngineMessage {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("uciok") => EngineMessage::UciOk,
        Some("readyok") => EngineMessage::ReadyOk,
        Some("bestmove") => EngineMessage::BestMove(
            tokens
                .next()
                .filter(|mv| *mv != "(none)" && *mv != "0000")
                .map(str::to_string),
        ),
        Some("info") => EngineMessage::Info(parse_score(tokens)),
        _ => EngineMessage::Other,
    }
}

fn parse_score<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Option<Score> {
    tokens.by_ref().find(|t| *t == "score")?;
    let kind = tokens.next()?;
    let value: i32 = tokens.next()?.parse().ok()?;
    match kind {
        "cp" => Some(Score::Centipawns(value)),
        "mate" => Some(Score::Mate(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_lines() {
        assert_eq!(parse_line("uciok"), EngineMessage::UciOk);
        assert_eq!(parse_line("readyok"), EngineMessage::ReadyOk);
        assert_eq!(parse_line("id name Leela"), EngineMessage::Other);
    }

    #[test]
    fn test_bestmove() {
        assert_eq!(parse_line("bestmove e2e4"), EngineMessage::BestMove(Some("e2e4".to_string())));
        assert_eq!(
            parse_line("bestmove e7e8q ponder a2a3"),
            EngineMessage::BestMove(Some("e7e8q".to_string()))
        );
        assert_eq!(parse_line("bestmove (none)"), EngineMessage::BestMove(None));
        assert_eq!(parse_line("bestmove 0000"), EngineMessage::BestMove(None));
        assert_eq!(parse_line("bestmove"), EngineMessage::BestMove(None));
    }

    #[test]
    fn test_info_score() {
        assert_eq!(
            parse_line("info depth 12 seldepth 20 score cp -35 nodes 1000 pv e2e4"),
            EngineMessage::Info(Some(Score::Centipawns(-35)))
        );
        assert_eq!(parse_line("info depth 1 score mate 0"), EngineMessage::Info(Some(Score::Mate(0))));
        assert_eq!(parse_line("info string hello"), EngineMessage::Info(None));
        assert!(Score::Mate(-2).is_mated());
        assert!(Score::Mate(0).is_mated());
        assert!(!Score::Mate(3).is_mated());
        assert!(!Score::Centipawns(-900).is_mated());
    }
}

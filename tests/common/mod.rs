#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chess_coach::advisor::{Advice, Advisor};
use chess_coach::analysis::EngineScore;
use chess_coach::db::{BlunderRecord, BlunderStore};
use chess_coach::error::CoachError;
use chess_coach::prompt::AdviceRequest;
use chess_coach::stockfish::Evaluator;
use chess_core::{fen_of, GameRecord};

pub const SCHOLARS_MATE: &str = r#"[Event "Casual"]
[White "Alice"]
[Black "Bob"]
[Result "1-0"]

1. e4 e5 2. Qh5 Nc6 3. Bc4 Nf6 4. Qxf7# 1-0"#;

/// FEN before each half-move of `pgn`, followed by the final position.
pub fn fens(pgn: &str) -> Vec<String> {
    let game = GameRecord::from_pgn(pgn).unwrap();
    let mut out: Vec<String> = game.positions().iter().map(fen_of).collect();
    out.push(fen_of(&game.final_position()));
    out
}

/// Evaluator answering from fixed tables. Unknown positions score 0.
#[derive(Default)]
pub struct ScriptedEvaluator {
    pub scores: HashMap<String, EngineScore>,
    pub best_moves: HashMap<String, String>,
    pub broken: HashSet<String>,
    /// Once this position is reached the engine is gone for good.
    pub dies_at: Option<String>,
    pub dead: bool,
    pub evaluated: Vec<String>,
}

impl ScriptedEvaluator {
    pub fn score(mut self, fen: &str, score: EngineScore) -> Self {
        self.scores.insert(fen.to_string(), score);
        self
    }

    pub fn best(mut self, fen: &str, uci: &str) -> Self {
        self.best_moves.insert(fen.to_string(), uci.to_string());
        self
    }

    pub fn broken_at(mut self, fen: &str) -> Self {
        self.broken.insert(fen.to_string());
        self
    }

    pub fn dies_at(mut self, fen: &str) -> Self {
        self.dies_at = Some(fen.to_string());
        self
    }

    fn check_alive(&mut self, fen: &str) -> Result<(), CoachError> {
        if self.dies_at.as_deref() == Some(fen) {
            self.dead = true;
        }
        if self.dead {
            return Err(CoachError::EngineUnavailable("Stockfish closed its output".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    async fn evaluate(&mut self, fen: &str) -> Result<EngineScore, CoachError> {
        self.evaluated.push(fen.to_string());
        self.check_alive(fen)?;
        if self.broken.contains(fen) {
            return Err(CoachError::Engine(format!("engine died on {fen}")));
        }
        Ok(self
            .scores
            .get(fen)
            .copied()
            .unwrap_or(EngineScore::Centipawns(0)))
    }

    async fn best_move(&mut self, fen: &str) -> Result<String, CoachError> {
        self.check_alive(fen)?;
        self.best_moves
            .get(fen)
            .cloned()
            .ok_or_else(|| CoachError::Engine("no best move".into()))
    }
}

/// Advisor that always gives the same answer and remembers what it was asked.
pub struct FixedAdvisor {
    pub advice: Advice,
    pub requests: Mutex<Vec<AdviceRequest>>,
}

impl FixedAdvisor {
    pub fn parsed(motif: &str, severity: &str, explanation: &str) -> Self {
        Self::new(Advice::Parsed {
            motif: motif.to_string(),
            severity: severity.to_string(),
            explanation: explanation.to_string(),
        })
    }

    pub fn failing() -> Self {
        Self::new(Advice::Failed("operation timed out".to_string()))
    }

    pub fn new(advice: Advice) -> Self {
        Self {
            advice,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<AdviceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Advisor for FixedAdvisor {
    async fn advise(&self, request: &AdviceRequest) -> Advice {
        self.requests.lock().unwrap().push(request.clone());
        self.advice.clone()
    }
}

/// Store whose writes always fail.
pub struct BrokenStore;

#[async_trait]
impl BlunderStore for BrokenStore {
    async fn append(&self, _record: &BlunderRecord) -> Result<(), CoachError> {
        Err(CoachError::Io(std::io::Error::other("disk full")))
    }

    async fn query_by_source(&self, _source: &str) -> Result<Vec<BlunderRecord>, CoachError> {
        Ok(Vec::new())
    }
}

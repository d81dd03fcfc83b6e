//! Stockfish engine wrapper using UCI protocol (async I/O)

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use tracing::debug;

use crate::analysis::EngineScore;
use crate::error::CoachError;

/// Position evaluation capability used by the blunder detector.
///
/// Implementations hold a single engine session and must not be shared between
/// concurrent walks. `CoachError::EngineUnavailable` means the session is gone
/// and no later call can succeed.
#[async_trait]
pub trait Evaluator: Send {
    /// Score of the position, on White's perspective.
    async fn evaluate(&mut self, fen: &str) -> Result<EngineScore, CoachError>;

    /// Best move of the position in UCI notation.
    async fn best_move(&mut self, fen: &str) -> Result<String, CoachError>;
}

/// Result of a single search
#[derive(Debug, Clone)]
struct SearchResult {
    /// Score relative to the side to move
    score: EngineScore,
    /// Best move in UCI notation (absent in terminal positions)
    best_move: Option<String>,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    depth: u32,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str, depth: u32) -> Result<Self, CoachError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CoachError::EngineUnavailable(format!("Failed to spawn {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| CoachError::EngineUnavailable("Engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| CoachError::EngineUnavailable("Engine stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout,
            depth,
        };

        engine
            .handshake()
            .await
            .map_err(|e| CoachError::EngineUnavailable(e.to_string()))?;

        Ok(engine)
    }

    async fn handshake(&mut self) -> Result<(), CoachError> {
        self.send("uci").await?;
        self.wait_for("uciok").await?;

        self.send("setoption name Threads value 1").await?;
        self.send("setoption name Hash value 128").await?;
        self.send("ucinewgame").await?;
        self.send("isready").await?;
        self.wait_for("readyok").await
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), CoachError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| CoachError::EngineUnavailable(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| CoachError::EngineUnavailable(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one line, failing if the engine closed its output.
    async fn read_line(&mut self, line: &mut String) -> Result<(), CoachError> {
        line.clear();
        let n = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| CoachError::EngineUnavailable(format!("Failed to read from Stockfish: {e}")))?;
        if n == 0 {
            return Err(CoachError::EngineUnavailable("Stockfish closed its output".into()));
        }
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), CoachError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Search a position to the configured depth
    async fn search(&mut self, fen: &str) -> Result<SearchResult, CoachError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {}", self.depth)).await?;

        let mut result = SearchResult {
            score: EngineScore::Unknown,
            best_move: None,
        };

        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" score ") {
                if let Some(score) = parse_score(trimmed) {
                    result.score = score;
                }
            } else if trimmed.starts_with("bestmove") {
                result.best_move = parse_bestmove(trimmed);
                break;
            }
        }

        debug!(fen, score = ?result.score, best = ?result.best_move, "SF search done");
        Ok(result)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

#[async_trait]
impl Evaluator for StockfishEngine {
    async fn evaluate(&mut self, fen: &str) -> Result<EngineScore, CoachError> {
        let result = self.search(fen).await?;
        Ok(result.score.from_side_to_move(white_to_move(fen)))
    }

    async fn best_move(&mut self, fen: &str) -> Result<String, CoachError> {
        self.search(fen)
            .await?
            .best_move
            .ok_or_else(|| CoachError::Engine(format!("No best move for {fen}")))
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

fn white_to_move(fen: &str) -> bool {
    fen.split_whitespace().nth(1) != Some("b")
}

/// Parse the score of an info line (relative to the side to move)
fn parse_score(line: &str) -> Option<EngineScore> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let idx = parts.iter().position(|p| *p == "score")?;
    let kind = parts.get(idx + 1)?;
    let value: i32 = parts.get(idx + 2)?.parse().ok()?;
    match *kind {
        "cp" => Some(EngineScore::Centipawns(value)),
        "mate" => Some(EngineScore::Mate(value)),
        _ => Some(EngineScore::Unknown),
    }
}

/// Parse the move of a bestmove line
fn parse_bestmove(line: &str) -> Option<String> {
    line.split_whitespace()
        .nth(1)
        .filter(|mv| *mv != "(none)")
        .map(str::to_string)
}

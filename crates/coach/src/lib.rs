//! Chess blunder coach: flags the moves that cost the most and asks a language
//! model to explain them.

pub use chess_core;

pub mod advisor;
pub mod analysis;
pub mod config;
pub mod db;
pub mod detector;
pub mod error;
pub mod prompt;
pub mod recorder;
pub mod stockfish;

pub use advisor::{Advice, Advisor, OllamaAdvisor};
pub use analysis::{EngineScore, SideFilter};
pub use config::CoachConfig;
pub use db::{BlunderRecord, BlunderStore, SqliteStore};
pub use detector::{analyze_pgn, BlunderDetector, DetectorSettings};
pub use error::CoachError;
pub use recorder::{format_comment, AnalysisReport};
pub use stockfish::{Evaluator, StockfishEngine};

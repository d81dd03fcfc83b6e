//! Coach configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::analysis::{SideFilter, DEFAULT_THRESHOLD};
use crate::error::CoachError;

#[derive(Clone, Debug)]
pub struct CoachConfig {
    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Search depth per evaluation
    pub search_depth: u32,

    /// Minimum centipawn drop that counts as a blunder
    pub blunder_threshold: u32,

    /// Which side's moves get inspected
    pub side: SideFilter,

    /// Base URL of the Ollama server
    pub ollama_url: String,

    /// Model used for explanations
    pub model: String,

    /// Advisor request timeout in seconds
    pub advisor_timeout_secs: u64,

    /// Sampling temperature sent to the model
    pub temperature: f32,

    /// Optional file overriding the built-in system prompt
    pub prompt_template_path: Option<PathBuf>,

    /// SQLite database URL
    pub database_url: String,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            stockfish_path: "/usr/local/bin/stockfish".to_string(),
            search_depth: 18,
            blunder_threshold: DEFAULT_THRESHOLD,
            side: SideFilter::Both,
            ollama_url: "http://localhost:11434".to_string(),
            model: "gemma3:1b".to_string(),
            advisor_timeout_secs: 60,
            temperature: 0.2,
            prompt_template_path: None,
            database_url: "sqlite://chess_coach.db".to_string(),
        }
    }
}

impl CoachConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, CoachError> {
        let defaults = Self::default();

        let side = match env::var("ANALYZE_SIDE") {
            Ok(v) => v.parse().map_err(CoachError::Config)?,
            Err(_) => defaults.side,
        };

        let config = Self {
            stockfish_path: env::var("STOCKFISH_PATH").unwrap_or(defaults.stockfish_path),
            search_depth: parse_env("SEARCH_DEPTH").unwrap_or(defaults.search_depth),
            blunder_threshold: parse_env("BLUNDER_THRESHOLD")
                .unwrap_or(defaults.blunder_threshold),
            side,
            ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            model: env::var("OLLAMA_MODEL").unwrap_or(defaults.model),
            advisor_timeout_secs: parse_env("ADVISOR_TIMEOUT_SECS")
                .unwrap_or(defaults.advisor_timeout_secs),
            temperature: parse_env("ADVISOR_TEMPERATURE").unwrap_or(defaults.temperature),
            prompt_template_path: env::var("PROMPT_TEMPLATE_PATH").ok().map(PathBuf::from),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
        };

        info!(
            stockfish_path = %config.stockfish_path,
            depth = config.search_depth,
            threshold = config.blunder_threshold,
            side = %config.side,
            model = %config.model,
            "Coach config loaded"
        );

        Ok(config)
    }

    pub fn advisor_timeout(&self) -> Duration {
        Duration::from_secs(self.advisor_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

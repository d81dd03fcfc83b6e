//! Prompt assembly for the advisor

use std::path::Path;

use crate::error::CoachError;

const DEFAULT_SYSTEM_PROMPT: &str = include_str!("../prompts/system_prompt.txt");

/// Everything the advisor is told about one flagged move.
#[derive(Debug, Clone)]
pub struct AdviceRequest {
    /// FEN of the position the move was played from
    pub position_fen: String,
    /// The move that was played (SAN)
    pub move_san: String,
    /// The engine's preferred move (SAN, or UCI if it could not be converted)
    pub best_move_san: String,
    /// Evaluation drop in centipawns
    pub eval_drop: u32,
    /// The position before the move was a forced mate
    pub mate_missed: bool,
}

/// The fixed instruction half of the prompt.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Load the instruction template from a file.
    pub fn load(path: &Path) -> Result<Self, CoachError> {
        let system = std::fs::read_to_string(path).map_err(|e| {
            CoachError::Config(format!("Cannot read prompt template {}: {e}", path.display()))
        })?;
        Ok(Self { system })
    }

    /// Built-in template unless a path is given.
    pub fn from_optional_path(path: Option<&Path>) -> Result<Self, CoachError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    /// The per-move context block.
    pub fn context(&self, request: &AdviceRequest) -> String {
        format!(
            "ANALYSIS CONTEXT\n\
             - FEN Before Move: {}\n\
             - Player's Move: {}\n\
             - Engine's Best Move: {}\n\
             - Centipawn Loss: {}\n\
             - Was a forced mate missed? {}\n",
            request.position_fen,
            request.move_san,
            request.best_move_san,
            request.eval_drop,
            if request.mate_missed { "Yes" } else { "No" },
        )
    }
}

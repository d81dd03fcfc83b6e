//! Coach error types

use chess_core::GameRecordError;
use thiserror::Error;

/// Errors that surface out of the coach.
///
/// Advisor problems never show up here: they are folded into the record as
/// [`crate::advisor::Advice::Failed`] / [`crate::advisor::Advice::Degraded`].
#[derive(Error, Debug)]
pub enum CoachError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Invalid game record: {0}")]
    InvalidGameRecord(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<GameRecordError> for CoachError {
    fn from(err: GameRecordError) -> Self {
        CoachError::InvalidGameRecord(err.to_string())
    }
}

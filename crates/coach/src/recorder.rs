//! Collects flagged moves: PGN annotations plus stored records.

use chess_core::{Annotation, GameRecord};
use serde::Serialize;
use tracing::error;

use crate::db::{BlunderRecord, BlunderStore};

pub const COMMENT_PREFIX: &str = "[COACH]";

/// Comment attached to a flagged move in the annotated PGN.
pub fn format_comment(severity: &str, motif: &str, explanation: &str) -> String {
    format!("{COMMENT_PREFIX} {severity} ({motif}): {explanation}")
}

/// Everything one analysis produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    pub records: Vec<BlunderRecord>,
    pub annotations: Vec<Annotation>,
    /// Records that could not be written to the store
    pub unsaved: usize,
    /// Moves left unscored because the engine failed on them
    pub skipped: usize,
}

impl AnalysisReport {
    /// The game with every flagged move's comment applied.
    pub fn annotated_pgn(&self, game: &GameRecord) -> String {
        game.to_pgn(&self.annotations)
    }
}

/// Per-walk collector. A store failure is logged and the walk goes on.
pub struct Recorder<'a, S: BlunderStore + ?Sized> {
    store: &'a S,
    report: AnalysisReport,
}

impl<'a, S: BlunderStore + ?Sized> Recorder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            report: AnalysisReport::default(),
        }
    }

    pub async fn record(&mut self, record: BlunderRecord) {
        self.report.annotations.push(Annotation {
            ply: record.ply as usize,
            comment: format_comment(&record.severity, &record.motif, &record.explanation),
        });

        if let Err(e) = self.store.append(&record).await {
            error!(source = %record.source, ply = record.ply, error = %e, "Failed to persist blunder");
            self.report.unsaved += 1;
        }
        self.report.records.push(record);
    }

    pub fn finish(self) -> AnalysisReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_comment() {
        assert_eq!(
            format_comment("Blunder", "HangingPiece", "The f7 pawn falls."),
            "[COACH] Blunder (HangingPiece): The f7 pawn falls."
        );
    }
}

//! Blunder detection: replay a game, score every position, explain the bad moves.
//!
//! The walk is strictly sequential. For each half-move the detector scores the
//! position before and after it; when the drop for the mover crosses the threshold
//! (and the mover's side is selected) it asks the engine for the better move, asks
//! the advisor why the played move was bad, and hands the result to the recorder.
//! Only a missing or dead engine, or an unreadable game, aborts the walk. Any other
//! evaluation failure skips that one move.

use chess_core::{color_name, fen_of, uci_to_san, GameRecord, HalfMove};
use chrono::Utc;
use shakmaty::{Chess, Position};
use tracing::{debug, error, info, warn};

use crate::advisor::Advisor;
use crate::analysis::{evaluation_drop, is_blunder, normalize, SideFilter};
use crate::config::CoachConfig;
use crate::db::{BlunderRecord, BlunderStore};
use crate::error::CoachError;
use crate::prompt::AdviceRequest;
use crate::recorder::{AnalysisReport, Recorder};
use crate::stockfish::{Evaluator, StockfishEngine};

/// Placeholder when the engine could not name a better move.
pub const UNKNOWN_MOVE: &str = "?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorSettings {
    pub threshold: u32,
    pub side: SideFilter,
}

impl From<&CoachConfig> for DetectorSettings {
    fn from(config: &CoachConfig) -> Self {
        Self {
            threshold: config.blunder_threshold,
            side: config.side,
        }
    }
}

pub struct BlunderDetector<'a, E, A, S>
where
    E: Evaluator + ?Sized,
    A: Advisor + ?Sized,
    S: BlunderStore + ?Sized,
{
    evaluator: &'a mut E,
    advisor: &'a A,
    store: &'a S,
    settings: DetectorSettings,
}

/// Scores around one half-move.
struct MoveEval {
    fen_before: String,
    mate_before: bool,
    drop: i32,
}

impl<'a, E, A, S> BlunderDetector<'a, E, A, S>
where
    E: Evaluator + ?Sized,
    A: Advisor + ?Sized,
    S: BlunderStore + ?Sized,
{
    pub fn new(
        evaluator: &'a mut E,
        advisor: &'a A,
        store: &'a S,
        settings: DetectorSettings,
    ) -> Self {
        Self {
            evaluator,
            advisor,
            store,
            settings,
        }
    }

    /// Walk the whole mainline of `game`, tagging records with `source`.
    pub async fn analyze(
        &mut self,
        source: &str,
        game: &GameRecord,
    ) -> Result<AnalysisReport, CoachError> {
        info!(
            source,
            white = game.white(),
            black = game.black(),
            moves = game.moves().len(),
            threshold = self.settings.threshold,
            side = %self.settings.side,
            "Starting analysis"
        );

        let mut recorder = Recorder::new(self.store);
        let mut pos = game.initial_position().clone();
        let mut skipped = 0usize;

        for half in game.moves() {
            let before = pos.clone();
            pos.play_unchecked(half.chess_move().clone());

            let eval = match self.score_move(&before, &pos).await {
                Ok(eval) => eval,
                Err(e @ CoachError::EngineUnavailable(_)) => {
                    error!(source, ply = half.ply, error = %e, "Engine lost, aborting analysis");
                    return Err(e);
                }
                Err(e) => {
                    warn!(ply = half.ply, san = %half.san, error = %e, "Evaluation failed, skipping move");
                    skipped += 1;
                    continue;
                }
            };

            let mover = before.turn();
            debug!(ply = half.ply, san = %half.san, mover = color_name(mover), drop = eval.drop, "Move scored");

            // A move that ends the game has nothing left to explain.
            if pos.is_game_over() {
                continue;
            }
            if !is_blunder(eval.drop, self.settings.threshold, mover, self.settings.side) {
                continue;
            }

            let record = self.investigate(source, &before, half, &eval).await?;
            recorder.record(record).await;
        }

        let mut report = recorder.finish();
        report.skipped = skipped;
        info!(
            source,
            blunders = report.records.len(),
            unsaved = report.unsaved,
            skipped,
            "Analysis complete"
        );
        Ok(report)
    }

    async fn score_move(&mut self, before: &Chess, after: &Chess) -> Result<MoveEval, CoachError> {
        let fen_before = fen_of(before);
        let raw_before = self.evaluator.evaluate(&fen_before).await?;
        let raw_after = self.evaluator.evaluate(&fen_of(after)).await?;

        Ok(MoveEval {
            drop: evaluation_drop(normalize(raw_before), normalize(raw_after), before.turn()),
            mate_before: raw_before.is_mate(),
            fen_before,
        })
    }

    async fn investigate(
        &mut self,
        source: &str,
        before: &Chess,
        half: &HalfMove,
        eval: &MoveEval,
    ) -> Result<BlunderRecord, CoachError> {
        let mover = before.turn();
        let move_number = before.fullmoves().get();

        let best_move_san = match self.evaluator.best_move(&eval.fen_before).await {
            Ok(uci) => uci_to_san(before, &uci).unwrap_or(uci),
            Err(e @ CoachError::EngineUnavailable(_)) => return Err(e),
            Err(e) => {
                warn!(ply = half.ply, error = %e, "Engine gave no best move");
                UNKNOWN_MOVE.to_string()
            }
        };

        let eval_drop = eval.drop.unsigned_abs();
        info!(
            move_number,
            mover = color_name(mover),
            san = %half.san,
            best = %best_move_san,
            eval_drop,
            "Blunder found"
        );

        let advice = self
            .advisor
            .advise(&AdviceRequest {
                position_fen: eval.fen_before.clone(),
                move_san: half.san.clone(),
                best_move_san: best_move_san.clone(),
                eval_drop,
                mate_missed: eval.mate_before,
            })
            .await;
        let (motif, severity, explanation) = advice.into_parts();

        Ok(BlunderRecord {
            source: source.to_string(),
            ply: half.ply as u32,
            move_number,
            player_color: color_name(mover).to_string(),
            move_san: half.san.clone(),
            position_fen: eval.fen_before.clone(),
            eval_drop,
            best_move_san,
            motif,
            severity,
            explanation,
            analyzed_at: Utc::now(),
        })
    }
}

/// Parse `pgn`, run a fresh engine over it and record the blunders in `store`.
///
/// Returns the parsed game alongside the report so callers can write the
/// annotated PGN.
pub async fn analyze_pgn<A, S>(
    config: &CoachConfig,
    source: &str,
    pgn: &str,
    advisor: &A,
    store: &S,
) -> Result<(GameRecord, AnalysisReport), CoachError>
where
    A: Advisor + ?Sized,
    S: BlunderStore + ?Sized,
{
    let game = GameRecord::from_pgn(pgn)?;
    let mut engine = StockfishEngine::new(&config.stockfish_path, config.search_depth).await?;

    let result = BlunderDetector::new(&mut engine, advisor, store, DetectorSettings::from(config))
        .analyze(source, &game)
        .await;
    engine.quit().await;

    Ok((game, result?))
}

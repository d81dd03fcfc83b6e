use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use chess_coach::advisor::OllamaAdvisor;
use chess_coach::analysis::SideFilter;
use chess_coach::config::CoachConfig;
use chess_coach::db::{BlunderStore, SqliteStore};
use chess_coach::detector::analyze_pgn;
use chrono::Utc;
use serde_json::{json, Value as JsonValue};

use crate::error::AppError;

/// POST /analyze
///
/// Body is the PGN text. Each request gets its own engine process and source id,
/// and both sides are always inspected.
pub async fn analyze_game(
    Extension(config): Extension<CoachConfig>,
    Extension(store): Extension<SqliteStore>,
    Extension(advisor): Extension<Arc<OllamaAdvisor>>,
    body: String,
) -> Result<Json<JsonValue>, AppError> {
    if body.trim().is_empty() {
        return Err(AppError::BadRequest("Request body must contain a PGN game".to_string()));
    }

    let source = format!("upload-{}", Utc::now().format("%Y%m%d%H%M%S%6f"));
    let config = CoachConfig {
        side: SideFilter::Both,
        ..config
    };

    let (game, report) = analyze_pgn(&config, &source, &body, advisor.as_ref(), &store).await?;
    tracing::info!(%source, blunders = report.records.len(), unsaved = report.unsaved, skipped = report.skipped, "Upload analyzed");

    let records = store.query_by_source(&source).await?;
    Ok(Json(json!({
        "source": source,
        "analysis": records,
        "annotated_pgn": report.annotated_pgn(&game),
        "skipped_moves": report.skipped,
        "unsaved_records": report.unsaved,
    })))
}

/// GET /analysis/{source}
pub async fn get_analysis(
    Extension(store): Extension<SqliteStore>,
    Path(source): Path<String>,
) -> Result<Json<JsonValue>, AppError> {
    let records = store.query_by_source(&source).await?;
    Ok(Json(json!({ "source": source, "analysis": records })))
}

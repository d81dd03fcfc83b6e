//! Blunder record storage

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use crate::error::CoachError;

/// One flagged move with the advisor's explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlunderRecord {
    /// Identifier of the analyzed game (file path or upload id)
    pub source: String,
    /// 1-based half-move index within the game
    pub ply: u32,
    /// Full-move number the move was played on
    pub move_number: u32,
    /// "White" or "Black"
    pub player_color: String,
    pub move_san: String,
    /// Position the move was played from
    pub position_fen: String,
    /// Evaluation drop in centipawns, from the mover's perspective
    pub eval_drop: u32,
    pub best_move_san: String,
    pub motif: String,
    pub severity: String,
    pub explanation: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Append-only sink for blunder records.
#[async_trait]
pub trait BlunderStore: Send + Sync {
    async fn append(&self, record: &BlunderRecord) -> Result<(), CoachError>;

    /// All records of one source, in move order.
    async fn query_by_source(&self, source: &str) -> Result<Vec<BlunderRecord>, CoachError>;
}

#[derive(FromRow)]
struct BlunderRow {
    source: String,
    ply: i64,
    move_number: i64,
    player_color: String,
    move_san: String,
    position_fen: String,
    eval_drop: i64,
    best_move_san: String,
    motif: String,
    severity: String,
    explanation: String,
    analyzed_at: DateTime<Utc>,
}

impl From<BlunderRow> for BlunderRecord {
    fn from(row: BlunderRow) -> Self {
        Self {
            source: row.source,
            ply: row.ply as u32,
            move_number: row.move_number as u32,
            player_color: row.player_color,
            move_san: row.move_san,
            position_fen: row.position_fen,
            eval_drop: row.eval_drop as u32,
            best_move_san: row.best_move_san,
            motif: row.motif,
            severity: row.severity,
            explanation: row.explanation,
            analyzed_at: row.analyzed_at,
        }
    }
}

/// SQLite-backed store.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, CoachError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Private in-memory database. A single connection that never recycles,
    /// otherwise every new connection would see an empty database.
    pub async fn in_memory() -> Result<Self, CoachError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), CoachError> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl BlunderStore for SqliteStore {
    async fn append(&self, record: &BlunderRecord) -> Result<(), CoachError> {
        sqlx::query(
            r#"INSERT INTO blunders (
                source, ply, move_number, player_color, move_san, position_fen,
                eval_drop, best_move_san, motif, severity, explanation, analyzed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&record.source)
        .bind(i64::from(record.ply))
        .bind(i64::from(record.move_number))
        .bind(&record.player_color)
        .bind(&record.move_san)
        .bind(&record.position_fen)
        .bind(i64::from(record.eval_drop))
        .bind(&record.best_move_san)
        .bind(&record.motif)
        .bind(&record.severity)
        .bind(&record.explanation)
        .bind(record.analyzed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query_by_source(&self, source: &str) -> Result<Vec<BlunderRecord>, CoachError> {
        let rows: Vec<BlunderRow> = sqlx::query_as(
            r#"SELECT source, ply, move_number, player_color, move_san, position_fen,
                      eval_drop, best_move_san, motif, severity, explanation, analyzed_at
               FROM blunders
               WHERE source = ?
               ORDER BY ply ASC, id ASC"#,
        )
        .bind(source)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BlunderRecord::from).collect())
    }
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS blunders (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    source        TEXT NOT NULL,
    ply           INTEGER NOT NULL,
    move_number   INTEGER NOT NULL,
    player_color  TEXT NOT NULL,
    move_san      TEXT NOT NULL,
    position_fen  TEXT NOT NULL,
    eval_drop     INTEGER NOT NULL,
    best_move_san TEXT NOT NULL,
    motif         TEXT NOT NULL,
    severity      TEXT NOT NULL,
    explanation   TEXT NOT NULL,
    analyzed_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_blunders_source
    ON blunders (source, ply);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, ply: u32, motif: &str) -> BlunderRecord {
        BlunderRecord {
            source: source.to_string(),
            ply,
            move_number: (ply + 1) / 2,
            player_color: if ply % 2 == 1 { "White" } else { "Black" }.to_string(),
            move_san: "Nf6".to_string(),
            position_fen: "8/8/8/8/8/8/8/8 w - - 0 1".to_string(),
            eval_drop: 300,
            best_move_san: "g6".to_string(),
            motif: motif.to_string(),
            severity: "Blunder".to_string(),
            explanation: "x".to_string(),
            analyzed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_and_query_in_move_order() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.run_migrations().await.unwrap();

        store.append(&record("a.pgn", 12, "Pin")).await.unwrap();
        store.append(&record("b.pgn", 3, "Fork")).await.unwrap();
        store.append(&record("a.pgn", 4, "Fork")).await.unwrap();

        let rows = store.query_by_source("a.pgn").await.unwrap();
        let plies: Vec<u32> = rows.iter().map(|r| r.ply).collect();
        assert_eq!(plies, vec![4, 12]);
        assert_eq!(rows[0].motif, "Fork");
        assert_eq!(rows[0].eval_drop, 300);
        assert!(store.query_by_source("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.run_migrations().await.unwrap();
        store.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_table_is_persistence_error() {
        let store = SqliteStore::in_memory().await.unwrap();
        let err = store.append(&record("a.pgn", 1, "Pin")).await.unwrap_err();
        assert!(matches!(err, CoachError::Persistence(_)));
    }
}

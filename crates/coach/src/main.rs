//! Chess Coach CLI
//!
//! Analyzes one PGN file with a local Stockfish, asks an Ollama model to explain
//! each blunder, stores the results and optionally writes an annotated copy.

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use chess_coach::advisor::OllamaAdvisor;
use chess_coach::analysis::SideFilter;
use chess_coach::config::CoachConfig;
use chess_coach::db::SqliteStore;
use chess_coach::detector::analyze_pgn;
use chess_coach::error::CoachError;

#[derive(Parser, Debug)]
#[command(name = "chess-coach", version, about = "Find and explain the blunders of a chess game")]
struct Cli {
    /// PGN file to analyze (first game only)
    pgn_file: PathBuf,

    /// Whose moves to inspect: white, black or both
    #[arg(long)]
    side: Option<SideFilter>,

    /// Write the annotated game to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Minimum evaluation drop (centipawns) that counts as a blunder
    #[arg(long)]
    threshold: Option<u32>,

    /// Engine search depth
    #[arg(long)]
    depth: Option<u32>,

    /// Ollama model name
    #[arg(long)]
    model: Option<String>,

    /// SQLite database URL
    #[arg(long)]
    database: Option<String>,

    /// Path to the Stockfish binary
    #[arg(long)]
    stockfish: Option<String>,
}

impl Cli {
    /// Command-line flags win over the environment.
    fn apply(&self, config: &mut CoachConfig) {
        if let Some(side) = self.side {
            config.side = side;
        }
        if let Some(threshold) = self.threshold {
            config.blunder_threshold = threshold;
        }
        if let Some(depth) = self.depth {
            config.search_depth = depth;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(database) = &self.database {
            config.database_url = database.clone();
        }
        if let Some(stockfish) = &self.stockfish {
            config.stockfish_path = stockfish.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = CoachConfig::from_env()?;
    cli.apply(&mut config);

    let pgn = std::fs::read_to_string(&cli.pgn_file).map_err(|e| {
        CoachError::InvalidGameRecord(format!("Cannot read {}: {e}", cli.pgn_file.display()))
    })?;

    let store = SqliteStore::connect(&config.database_url).await?;
    store.run_migrations().await?;
    let advisor = OllamaAdvisor::from_config(&config)?;

    let source = cli.pgn_file.display().to_string();
    let (game, report) = analyze_pgn(&config, &source, &pgn, &advisor, &store).await?;

    println!("{} vs {}: {} blunder(s)", game.white(), game.black(), report.records.len());
    for record in &report.records {
        println!(
            "{}. {} {} (best {}, -{} cp) {} ({}): {}",
            record.move_number,
            record.player_color,
            record.move_san,
            record.best_move_san,
            record.eval_drop,
            record.severity,
            record.motif,
            record.explanation
        );
    }
    if report.skipped > 0 {
        println!("{} move(s) could not be evaluated and were skipped", report.skipped);
    }
    if report.unsaved > 0 {
        println!("{} record(s) could not be saved to the database", report.unsaved);
    }

    if let Some(path) = &cli.output {
        match std::fs::write(path, report.annotated_pgn(&game)) {
            Ok(()) => info!(path = %path.display(), "Annotated PGN written"),
            Err(e) => error!(path = %path.display(), error = %e, "Failed to write annotated PGN"),
        }
    }

    Ok(())
}

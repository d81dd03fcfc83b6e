//! HTTP API tests. Each test serves the router on an ephemeral local port.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chess_coach::advisor::OllamaAdvisor;
use chess_coach::config::CoachConfig;
use chess_coach::db::{BlunderRecord, BlunderStore, SqliteStore};
use chess_coach::prompt::PromptTemplate;
use serde_json::Value;

use common::SCHOLARS_MATE;

async fn spawn_server(store: SqliteStore) -> String {
    let config = CoachConfig {
        stockfish_path: "/nonexistent/stockfish-binary".to_string(),
        ..CoachConfig::default()
    };
    let advisor = OllamaAdvisor::new(
        "http://127.0.0.1:9",
        "gemma3:1b",
        0.2,
        Duration::from_millis(500),
        PromptTemplate::default(),
    )
    .unwrap();
    let app = server::app(config, store, Arc::new(advisor));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn memory_store() -> SqliteStore {
    let store = SqliteStore::in_memory().await.unwrap();
    store.run_migrations().await.unwrap();
    store
}

#[tokio::test]
async fn test_root_welcome() {
    let base = spawn_server(memory_store().await).await;
    let body: Value = reqwest::get(format!("{base}/"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "Welcome to the Chess Coach API!");
}

#[tokio::test]
async fn test_analyze_empty_body_is_bad_request() {
    let base = spawn_server(memory_store().await).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/analyze"))
        .body("   ")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_analyze_illegal_game_is_bad_request() {
    let base = spawn_server(memory_store().await).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/analyze"))
        .body("1. e4 e4 *")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("Invalid PGN"));
}

#[tokio::test]
async fn test_analyze_without_engine_is_unavailable() {
    let base = spawn_server(memory_store().await).await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/analyze"))
        .body(SCHOLARS_MATE)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
}

#[tokio::test]
async fn test_get_analysis_by_source() {
    let store = memory_store().await;
    store
        .append(&BlunderRecord {
            source: "upload-1".to_string(),
            ply: 6,
            move_number: 3,
            player_color: "Black".to_string(),
            move_san: "Nf6".to_string(),
            position_fen: common::fens(SCHOLARS_MATE)[5].clone(),
            eval_drop: 950,
            best_move_san: "g6".to_string(),
            motif: "HangingPiece".to_string(),
            severity: "Blunder".to_string(),
            explanation: "f7 falls.".to_string(),
            analyzed_at: chrono::Utc::now(),
        })
        .await
        .unwrap();
    let base = spawn_server(store).await;

    let body: Value = reqwest::get(format!("{base}/analysis/upload-1"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let analysis = body["analysis"].as_array().unwrap();
    assert_eq!(analysis.len(), 1);
    assert_eq!(analysis[0]["move_san"], "Nf6");
    assert_eq!(analysis[0]["eval_drop"], 950);

    let body: Value = reqwest::get(format!("{base}/analysis/unknown"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["analysis"].as_array().unwrap().is_empty());
}

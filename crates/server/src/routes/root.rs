use axum::Json;
use serde_json::{json, Value as JsonValue};

/// GET /
pub async fn welcome() -> Json<JsonValue> {
    Json(json!({ "message": "Welcome to the Chess Coach API!" }))
}

pub mod response;
pub mod send;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use super::AppState;

pub use response::SendResponse;

/// Routes under `/api/send`, all of which require the API key.
pub fn send_router() -> Router<AppState> {
    send::router()
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

/// Routes under `/api` that are open without a key.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::Deserialize;
use tracing::error;
use wecom_relay_core::{DispatchError, MessageKind, NormalizedRequest};

use super::response::SendResponse;
use crate::http::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/text", post(send_text))
        .route("/image", post(send_image))
        .route("/markdown", post(send_markdown))
}

#[derive(Debug, Deserialize)]
pub struct SendTextRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub touser: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendImageRequest {
    /// Base64-encoded image bytes
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub touser: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMarkdownRequest {
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub touser: Option<String>,
}

async fn send_text(
    State(state): State<AppState>,
    payload: Result<Json<SendTextRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, ApiError> {
    let Json(req) = payload.map_err(|err| ApiError::bad_request(err.body_text()))?;
    dispatch(&state, MessageKind::Text, &req.text, req.touser).await
}

async fn send_image(
    State(state): State<AppState>,
    payload: Result<Json<SendImageRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, ApiError> {
    let Json(req) = payload.map_err(|err| ApiError::bad_request(err.body_text()))?;
    dispatch(&state, MessageKind::Image, &req.image, req.touser).await
}

async fn send_markdown(
    State(state): State<AppState>,
    payload: Result<Json<SendMarkdownRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, ApiError> {
    let Json(req) = payload.map_err(|err| ApiError::bad_request(err.body_text()))?;
    dispatch(&state, MessageKind::Markdown, &req.markdown, req.touser).await
}

async fn dispatch(
    state: &AppState,
    kind: MessageKind,
    content: &str,
    touser: Option<String>,
) -> Result<Json<SendResponse>, ApiError> {
    let request = NormalizedRequest::from_tagged(kind, content, touser)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    match state.gateway.handle(request).await {
        Ok(receipt) => Ok(Json(SendResponse::delivered(receipt))),
        Err(DispatchError::RemoteRejection {
            code,
            message,
            receipt,
        }) => Ok(Json(SendResponse::rejected(code, message, receipt))),
        Err(err) => {
            error!(%kind, error = %err, "Failed to send {} message", kind);
            Err(ApiError::internal(err.to_string()))
        }
    }
}

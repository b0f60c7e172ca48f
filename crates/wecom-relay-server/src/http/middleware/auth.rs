use crate::http::ApiError;
use axum::{
    extract::{Query, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Deserialize)]
struct KeyQuery {
    api_key: Option<String>,
}

/// Reject the request unless it presents the configured key, either in the
/// `X-API-Key` header or the `api_key` query parameter.
pub async fn require_api_key(req: Request, next: Next, api_key: Arc<str>) -> Response {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| {
            Query::<KeyQuery>::try_from_uri(req.uri())
                .ok()
                .and_then(|Query(query)| query.api_key)
        });

    match presented {
        Some(key) if key == *api_key => next.run(req).await,
        _ => ApiError::unauthorized("Invalid API key").into_response(),
    }
}

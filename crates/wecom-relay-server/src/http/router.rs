use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    middleware::Next,
    routing::get,
};
use tower_http::trace::TraceLayer;

use super::{AppState, api, assets, middleware};
use crate::MAX_INBOUND_BYTES;

pub fn build_router(state: AppState) -> Router {
    let api_key = state.api_key.clone();
    let send_routes = api::send_router().route_layer(axum::middleware::from_fn(
        move |req: Request, next: Next| {
            let api_key = api_key.clone();
            async move { middleware::auth::require_api_key(req, next, api_key).await }
        },
    ));

    Router::new()
        .route("/", get(assets::static_handler))
        .nest("/api", api::public_router().nest("/send", send_routes))
        .layer(DefaultBodyLimit::max(MAX_INBOUND_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

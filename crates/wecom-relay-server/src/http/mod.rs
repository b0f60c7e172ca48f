pub mod api;
pub mod assets;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;

use std::sync::Arc;

use wecom_relay_core::DispatchGateway;

pub use error::ApiError;
pub use server::HttpServer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<DispatchGateway>,
    pub api_key: Arc<str>,
}

impl AppState {
    pub fn new(gateway: Arc<DispatchGateway>, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            gateway,
            api_key: api_key.into(),
        }
    }
}

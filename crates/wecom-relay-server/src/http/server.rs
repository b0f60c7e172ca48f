use anyhow::Result;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{AppState, router};

/// HTTP adapter: send endpoints, health probe and the test page.
pub struct HttpServer {
    addr: String,
    state: AppState,
}

impl HttpServer {
    pub fn new(addr: impl Into<String>, state: AppState) -> Self {
        Self {
            addr: addr.into(),
            state,
        }
    }

    fn build_router(&self) -> Router {
        router::build_router(self.state.clone())
    }

    /// Run until `shutdown` is cancelled, then drain in-flight requests.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let app = self.build_router();

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!("HTTP server listening on {}", self.addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                info!("HTTP server shutting down");
            })
            .await?;

        Ok(())
    }
}

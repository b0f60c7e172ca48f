use anyhow::{Context, Result};
use tracing::{info, warn};
use wecom_relay_server::config::ServerConfig;
use wecom_relay_server::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    let config = ServerConfig::from_env().context("Invalid configuration")?;
    let _log_guard = init_logging(&config.log)?;

    if dotenv.is_err() {
        warn!("No .env file found, using process environment only");
    }
    info!(config = ?config, "Starting WeCom relay");

    wecom_relay_server::run(config).await
}

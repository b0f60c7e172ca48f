//! WeCom Relay Server
//!
//! Process wiring for the relay: environment configuration, logging, the
//! HTTP and MQTT adapters and the background token refresher, all sharing
//! one [`DispatchGateway`].

pub mod config;
pub mod http;
pub mod logging;
pub mod mqtt;

#[cfg(test)]
mod test_support;

/// Largest inbound request either adapter accepts. Base64 inflates the
/// 10 MB image limit to ~13.4 MB, so the cap leaves headroom for that.
pub const MAX_INBOUND_BYTES: usize = 16 * 1024 * 1024;

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use wecom_relay_core::{BackgroundRefresher, CredentialCache, DispatchGateway, WeComSender};

use crate::config::ServerConfig;
use crate::http::{AppState, HttpServer};
use crate::mqtt::MqttListener;

/// Run the relay until Ctrl-C or SIGTERM.
pub async fn run(config: ServerConfig) -> Result<()> {
    let client = reqwest::Client::builder().build()?;
    let account = Arc::new(config.account.clone());

    let credentials = Arc::new(CredentialCache::new(account.clone(), client.clone()));
    let sender = Arc::new(WeComSender::new(account.clone(), client));
    let gateway = Arc::new(DispatchGateway::new(
        account,
        credentials.clone(),
        sender,
    ));

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let refresher = BackgroundRefresher::new(credentials).spawn(shutdown.clone());

    let mqtt = match config.mqtt.clone() {
        Some(mqtt_config) => {
            Some(MqttListener::new(mqtt_config, gateway.clone()).spawn(shutdown.clone()))
        }
        None => {
            info!("MQTT_BROKER not set, MQTT listener disabled");
            None
        }
    };

    let server = HttpServer::new(config.bind_addr(), AppState::new(gateway, config.api_key));
    let served = server.run(shutdown.clone()).await;

    // Stop the other tasks even when the listener failed to bind.
    shutdown.cancel();
    if let Err(err) = refresher.await {
        error!(error = %err, "Token refresher panicked");
    }
    if let Some(handle) = mqtt
        && let Err(err) = handle.await
    {
        error!(error = %err, "MQTT listener panicked");
    }

    served?;
    info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(err) => {
                    error!(error = %err, "Failed to install SIGTERM handler");
                    let _ = tokio::signal::ctrl_c().await;
                    shutdown.cancel();
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl-C");
    }

    shutdown.cancel();
}

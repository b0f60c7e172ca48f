//! MQTT adapter
//!
//! Subscribes to the notify topic and turns each publish into a
//! [`NormalizedRequest`]. The event loop only parses and forwards; a single
//! worker task dispatches the requests one at a time so a slow send never
//! stalls keep-alives.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wecom_relay_core::{
    DispatchGateway, DispatchResult, MessageKind, NormalizedRequest, PayloadError,
};

use crate::MAX_INBOUND_BYTES;
use crate::config::MqttConfig;

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const REQUEST_CAPACITY: usize = 10;
const QUEUE_CAPACITY: usize = 64;

/// Message published on the notify topic.
#[derive(Debug, Deserialize)]
pub struct PublishedMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub touser: Option<String>,
}

#[derive(Error, Debug)]
pub enum MqttPayloadError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

pub fn parse_payload(payload: &[u8]) -> Result<NormalizedRequest, MqttPayloadError> {
    let message: PublishedMessage = serde_json::from_slice(payload)?;
    let kind: MessageKind = message.kind.parse()?;
    Ok(NormalizedRequest::from_tagged(
        kind,
        &message.content,
        message.touser,
    )?)
}

/// Parse and dispatch one payload. Returns `None` when the payload was dropped.
pub async fn handle_payload(
    gateway: &DispatchGateway,
    payload: &[u8],
) -> Option<DispatchResult> {
    let request = match parse_payload(payload) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "Dropping MQTT message");
            return None;
        }
    };

    // The gateway logs the dispatch outcome.
    Some(gateway.handle(request).await)
}

pub struct MqttListener {
    config: MqttConfig,
    gateway: Arc<DispatchGateway>,
}

impl MqttListener {
    pub fn new(config: MqttConfig, gateway: Arc<DispatchGateway>) -> Self {
        Self { config, gateway }
    }

    fn options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.config.client_id.clone(),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_keep_alive(KEEP_ALIVE);
        options.set_clean_session(true);
        // The client default of 10 KiB would reject any real image payload.
        options.set_max_packet_size(MAX_INBOUND_BYTES, MAX_INBOUND_BYTES);
        if let Some(username) = &self.config.username {
            options.set_credentials(
                username.clone(),
                self.config.password.clone().unwrap_or_default(),
            );
        }
        options
    }

    /// Start the event loop and the dispatch worker. The returned handle
    /// completes once both have stopped after `shutdown` is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        let (client, eventloop) = AsyncClient::new(self.options(), REQUEST_CAPACITY);
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);

        info!(
            broker = %format!("{}:{}", self.config.host, self.config.port),
            topic = %self.config.topic,
            "Starting MQTT listener"
        );

        let worker = tokio::spawn(run_worker(self.gateway, rx));
        let topic = self.config.topic;

        tokio::spawn(async move {
            poll_events(&client, eventloop, &topic, tx, shutdown).await;
            if let Err(err) = client.try_disconnect() {
                debug!(error = %err, "MQTT disconnect request not queued");
            }
            if let Err(err) = worker.await {
                error!(error = %err, "MQTT worker panicked");
            }
            info!("MQTT listener stopped");
        })
    }
}

async fn poll_events(
    client: &AsyncClient,
    mut eventloop: EventLoop,
    topic: &str,
    tx: mpsc::Sender<Vec<u8>>,
    shutdown: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            event = eventloop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!(topic, "Connected to MQTT broker");
                if let Err(err) = client.try_subscribe(topic, QoS::AtMostOnce) {
                    error!(topic, error = %err, "Failed to subscribe");
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                debug!(topic = %publish.topic, bytes = publish.payload.len(), "MQTT message received");
                let forwarded = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    sent = tx.send(publish.payload.to_vec()) => sent,
                };
                if forwarded.is_err() {
                    warn!("MQTT worker gone, stopping listener");
                    break;
                }
            }
            Ok(_) => {}
            Err(err) => {
                error!(error = %err, "MQTT connection error, retrying in {:?}", RECONNECT_DELAY);
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                }
            }
        }
    }
}

async fn run_worker(gateway: Arc<DispatchGateway>, mut rx: mpsc::Receiver<Vec<u8>>) {
    while let Some(payload) = rx.recv().await {
        handle_payload(&gateway, &payload).await;
    }
}

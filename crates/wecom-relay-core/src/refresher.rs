//! Periodic access token refresh
//!
//! Keeps the cached token warm so interactive requests rarely pay the
//! token exchange latency. Not required for correctness: every dispatch
//! acquires its own credential.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::credential::CredentialSource;

/// Default refresh period.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub struct BackgroundRefresher {
    credentials: Arc<dyn CredentialSource>,
    period: Duration,
}

impl BackgroundRefresher {
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            credentials,
            period: REFRESH_INTERVAL,
        }
    }

    /// Set refresh period
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Run until `shutdown` is cancelled. The first refresh happens one
    /// period after spawning.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, shutdown: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(period_secs = self.period.as_secs(), "Token refresher started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match self.credentials.acquire().await {
                        Ok(credential) => debug!(
                            expires_at = %credential.expires_at.to_rfc3339(),
                            "Access token is fresh"
                        ),
                        Err(err) => error!(error = %err, "Failed to refresh access token"),
                    }
                }
            }
        }

        info!("Token refresher stopped");
    }
}

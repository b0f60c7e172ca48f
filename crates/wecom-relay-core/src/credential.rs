//! Access token cache
//!
//! Holds the single access token of the configured account and refreshes it
//! from the issuer on miss or expiry.
//!
//! Lookups take the shared lock; a refresh takes the exclusive lock, re-checks
//! the cached value and fetches while still holding it. Callers that raced
//! past the shared lock queue on the exclusive lock and find the fresh token
//! when they get it, so one expiry causes at most one token request.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::account::AccountContext;
use crate::error::AuthFailure;
use crate::wire::TokenResponse;

const TOKEN_PATH: &str = "/cgi-bin/gettoken";
/// Seconds subtracted from the issuer TTL before a token is considered stale.
pub const SAFETY_MARGIN_SECS: i64 = 300;

/// An access token and the instant after which it must not be used.
///
/// `expires_at` already includes the safety margin.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential from an issuer TTL, applying the safety margin.
    pub fn issued_at(token: impl Into<String>, now: DateTime<Utc>, ttl_secs: i64) -> Self {
        let lifetime = ttl_secs.saturating_sub(SAFETY_MARGIN_SECS).max(0);
        Self {
            token: token.into(),
            expires_at: now + Duration::seconds(lifetime),
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Anything that can hand out a currently valid credential.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn acquire(&self) -> Result<Credential, AuthFailure>;
}

/// Token cache backed by the issuer's `gettoken` endpoint.
pub struct CredentialCache {
    account: Arc<AccountContext>,
    client: Client,
    cached: RwLock<Option<Credential>>,
}

impl CredentialCache {
    pub fn new(account: Arc<AccountContext>, client: Client) -> Self {
        Self {
            account,
            client,
            cached: RwLock::new(None),
        }
    }

    /// Current cached credential, valid or not, without contacting the issuer.
    pub async fn cached(&self) -> Option<Credential> {
        self.cached.read().await.clone()
    }

    async fn fetch(&self) -> Result<Credential, AuthFailure> {
        let url = self.account.endpoint(TOKEN_PATH);
        debug!(corp_id = %self.account.corp_id, "Fetching access token");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("corpid", self.account.corp_id.as_str()),
                ("corpsecret", self.account.secret.as_str()),
            ])
            .send()
            .await
            .map_err(|err| {
                AuthFailure::Transport(format!("failed to get token: {}", err.without_url()))
            })?;

        let body: TokenResponse = response.json().await.map_err(|err| {
            AuthFailure::Transport(format!(
                "failed to decode token response: {}",
                err.without_url()
            ))
        })?;

        if body.errcode != 0 {
            return Err(AuthFailure::Rejected {
                code: body.errcode,
                message: body.errmsg,
            });
        }

        let credential = Credential::issued_at(body.access_token, Utc::now(), body.expires_in);
        info!(
            expires_at = %credential.expires_at.to_rfc3339(),
            "Access token refreshed"
        );
        Ok(credential)
    }
}

#[async_trait]
impl CredentialSource for CredentialCache {
    async fn acquire(&self) -> Result<Credential, AuthFailure> {
        {
            let cached = self.cached.read().await;
            if let Some(credential) = cached.as_ref()
                && credential.is_valid()
            {
                return Ok(credential.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another caller may have refreshed while we waited for the write lock.
        if let Some(credential) = cached.as_ref()
            && credential.is_valid()
        {
            return Ok(credential.clone());
        }

        let credential = self.fetch().await?;
        *cached = Some(credential.clone());
        Ok(credential)
    }
}

//! Dispatch gateway
//!
//! The single entry point used by both inbound channels: resolves the
//! recipient, obtains a credential and hands the request to the sender.
//! Results are returned unchanged; each channel maps them to its own
//! protocol.

use std::sync::Arc;
use tracing::{info, warn};

use crate::account::AccountContext;
use crate::credential::CredentialSource;
use crate::error::{DispatchError, DispatchResult};
use crate::message::NormalizedRequest;
use crate::sender::MessageSender;

pub struct DispatchGateway {
    account: Arc<AccountContext>,
    credentials: Arc<dyn CredentialSource>,
    sender: Arc<dyn MessageSender>,
}

impl DispatchGateway {
    pub fn new(
        account: Arc<AccountContext>,
        credentials: Arc<dyn CredentialSource>,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            account,
            credentials,
            sender,
        }
    }

    /// Recipient the request will be delivered to.
    pub fn resolve_recipient<'a>(&'a self, request: &'a NormalizedRequest) -> &'a str {
        request
            .recipient_override()
            .unwrap_or(&self.account.default_recipient)
    }

    pub async fn handle(&self, request: NormalizedRequest) -> DispatchResult {
        let kind = request.kind();
        let recipient = self.resolve_recipient(&request);

        let credential = match self.credentials.acquire().await {
            Ok(credential) => credential,
            Err(err) => {
                warn!(%kind, recipient, error = %err, "Dispatch aborted: no access token");
                return Err(DispatchError::Auth(err));
            }
        };

        let result = self.sender.send(&credential, &request, recipient).await;
        match &result {
            Ok(_) => info!(%kind, recipient, "Message dispatched"),
            Err(DispatchError::RemoteRejection { code, message, .. }) => {
                warn!(%kind, recipient, errcode = code, errmsg = %message, "Message rejected by WeCom")
            }
            Err(err) => warn!(%kind, recipient, error = %err, "Message dispatch failed"),
        }
        result
    }
}

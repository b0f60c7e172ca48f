//! Mock credential source and sender shared by the adapter tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use wecom_relay_core::{
    AccountContext, AuthFailure, Credential, CredentialSource, DispatchGateway, DispatchResult,
    MessageSender, NormalizedRequest, SendReceipt,
};

pub struct MockCredentials {
    outcome: Result<Credential, AuthFailure>,
}

impl MockCredentials {
    pub fn ok() -> Self {
        Self {
            outcome: Ok(Credential::issued_at("MOCK_TOKEN", Utc::now(), 7200)),
        }
    }

    pub fn failing(failure: AuthFailure) -> Self {
        Self {
            outcome: Err(failure),
        }
    }
}

#[async_trait]
impl CredentialSource for MockCredentials {
    async fn acquire(&self) -> Result<Credential, AuthFailure> {
        self.outcome.clone()
    }
}

/// Records every send and answers with a fixed result.
pub struct MockSender {
    answer: DispatchResult,
    sent: Mutex<Vec<(NormalizedRequest, String)>>,
}

impl MockSender {
    pub fn answering(answer: DispatchResult) -> Self {
        Self {
            answer,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub async fn sent(&self) -> Vec<(NormalizedRequest, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MessageSender for MockSender {
    async fn send(
        &self,
        _credential: &Credential,
        request: &NormalizedRequest,
        recipient: &str,
    ) -> DispatchResult {
        self.sent
            .lock()
            .await
            .push((request.clone(), recipient.to_string()));
        self.answer.clone()
    }
}

pub fn ok_receipt() -> SendReceipt {
    SendReceipt {
        errcode: 0,
        errmsg: "ok".to_string(),
        invaliduser: String::new(),
        invalidparty: String::new(),
        invalidtag: String::new(),
    }
}

pub fn gateway_with(credentials: MockCredentials, sender: Arc<MockSender>) -> DispatchGateway {
    let account = Arc::new(AccountContext::new("corp", "secret", 1000002));
    DispatchGateway::new(account, Arc::new(credentials), sender)
}

//! Outbound message sender
//!
//! Performs the WeCom send exchange for a normalized request. Text and
//! markdown go out in a single call; images are uploaded first and then sent
//! by media reference.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

use crate::account::AccountContext;
use crate::credential::Credential;
use crate::error::{DispatchError, DispatchResult};
use crate::message::{MessageBody, NormalizedRequest};
use crate::wire::{EnvelopePayload, SendEnvelope, SendReceipt, UploadResponse};

const SEND_PATH: &str = "/cgi-bin/message/send";
const UPLOAD_PATH: &str = "/cgi-bin/media/upload";
const UPLOAD_FIELD: &str = "media";
const UPLOAD_FILE_NAME: &str = "image.jpg";

/// Delivers one normalized request to the outbound endpoint.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(
        &self,
        credential: &Credential,
        request: &NormalizedRequest,
        recipient: &str,
    ) -> DispatchResult;
}

/// [`MessageSender`] for the WeCom application-message API.
pub struct WeComSender {
    account: Arc<AccountContext>,
    client: Client,
}

impl WeComSender {
    pub fn new(account: Arc<AccountContext>, client: Client) -> Self {
        Self { account, client }
    }

    /// Upload raw image bytes, returning the media reference.
    async fn upload_image(
        &self,
        credential: &Credential,
        bytes: &[u8],
    ) -> Result<String, DispatchError> {
        let part = Part::bytes(bytes.to_vec()).file_name(UPLOAD_FILE_NAME);
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(self.account.endpoint(UPLOAD_PATH))
            .query(&[("access_token", credential.token.as_str()), ("type", "image")])
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                DispatchError::transport(format!("failed to upload image: {}", err.without_url()))
            })?;

        let upload: UploadResponse = decode(response, "upload").await?;
        if upload.errcode != 0 {
            return Err(DispatchError::RemoteRejection {
                code: upload.errcode,
                message: upload.errmsg,
                receipt: None,
            });
        }
        if upload.media_id.is_empty() {
            return Err(DispatchError::transport("upload response missing media_id"));
        }

        debug!(media_id = %upload.media_id, media_type = %upload.media_type, "Image uploaded");
        Ok(upload.media_id)
    }

    async fn post_envelope(
        &self,
        credential: &Credential,
        envelope: &SendEnvelope<'_>,
    ) -> DispatchResult {
        let response = self
            .client
            .post(self.account.endpoint(SEND_PATH))
            .query(&[("access_token", credential.token.as_str())])
            .json(envelope)
            .send()
            .await
            .map_err(|err| {
                DispatchError::transport(format!("failed to send message: {}", err.without_url()))
            })?;

        let receipt: SendReceipt = decode(response, "send").await?;
        if receipt.errcode != 0 {
            return Err(DispatchError::RemoteRejection {
                code: receipt.errcode,
                message: receipt.errmsg.clone(),
                receipt: Some(receipt),
            });
        }
        Ok(receipt)
    }
}

#[async_trait]
impl MessageSender for WeComSender {
    async fn send(
        &self,
        credential: &Credential,
        request: &NormalizedRequest,
        recipient: &str,
    ) -> DispatchResult {
        let agent_id = self.account.agent_id;

        match &request.body {
            MessageBody::Text(content) => {
                let envelope =
                    SendEnvelope::new(recipient, agent_id, EnvelopePayload::Text { content });
                self.post_envelope(credential, &envelope).await
            }
            MessageBody::Markdown(content) => {
                let envelope =
                    SendEnvelope::new(recipient, agent_id, EnvelopePayload::Markdown { content });
                self.post_envelope(credential, &envelope).await
            }
            MessageBody::Image(bytes) => {
                let media_id = self.upload_image(credential, bytes).await?;
                let envelope = SendEnvelope::new(
                    recipient,
                    agent_id,
                    EnvelopePayload::Image {
                        media_id: &media_id,
                    },
                );
                self.post_envelope(credential, &envelope).await
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    phase: &str,
) -> Result<T, DispatchError> {
    response.json::<T>().await.map_err(|err| {
        DispatchError::transport(format!(
            "failed to decode {} response: {}",
            phase,
            err.without_url()
        ))
    })
}

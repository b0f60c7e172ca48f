//! WeCom API wire formats
//!
//! Request envelopes and response bodies exchanged with the outbound
//! endpoint. Every response carries `errcode`/`errmsg`; `errcode == 0` means
//! success.

use serde::{Deserialize, Serialize};

use crate::message::MessageKind;

/// Duplicate-suppression window (seconds) requested on every send.
pub const DUPLICATE_CHECK_INTERVAL_SECS: u32 = 600;

/// Response of `GET /cgi-bin/gettoken`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub expires_in: i64,
}

/// Response of `POST /cgi-bin/media/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: String,
    #[serde(default, rename = "type")]
    pub media_type: String,
    #[serde(default)]
    pub media_id: String,
    #[serde(default)]
    pub created_at: String,
}

/// Response of `POST /cgi-bin/message/send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub invaliduser: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub invalidparty: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub invalidtag: String,
}

/// Message-type specific body of a send envelope.
///
/// Serialized under a key named after the message type, e.g.
/// `"text": {"content": "..."}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopePayload<'a> {
    Text { content: &'a str },
    Image { media_id: &'a str },
    Markdown { content: &'a str },
}

impl EnvelopePayload<'_> {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text { .. } => MessageKind::Text,
            Self::Image { .. } => MessageKind::Image,
            Self::Markdown { .. } => MessageKind::Markdown,
        }
    }
}

/// JSON body of `POST /cgi-bin/message/send`.
#[derive(Debug, Clone, Serialize)]
pub struct SendEnvelope<'a> {
    pub touser: &'a str,
    pub agentid: i64,
    pub msgtype: MessageKind,
    #[serde(flatten)]
    pub payload: EnvelopePayload<'a>,
    pub duplicate_check_interval: u32,
}

impl<'a> SendEnvelope<'a> {
    pub fn new(touser: &'a str, agentid: i64, payload: EnvelopePayload<'a>) -> Self {
        Self {
            touser,
            agentid,
            msgtype: payload.kind(),
            payload,
            duplicate_check_interval: DUPLICATE_CHECK_INTERVAL_SECS,
        }
    }
}

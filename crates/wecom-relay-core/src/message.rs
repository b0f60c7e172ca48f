//! Normalized requests
//!
//! Both inbound channels translate their payloads into a [`NormalizedRequest`]
//! before handing it to the dispatch gateway.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PayloadError;

/// Message type, as named by the outbound `msgtype` field and the
/// publish/subscribe `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Markdown,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Markdown => "markdown",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = PayloadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "markdown" => Ok(Self::Markdown),
            other => Err(PayloadError::UnknownKind(other.to_string())),
        }
    }
}

/// Content of a normalized request.
#[derive(Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    /// Raw image bytes, uploaded before the send phase.
    Image(Vec<u8>),
    Markdown(String),
}

impl MessageBody {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text(_) => MessageKind::Text,
            Self::Image(_) => MessageKind::Image,
            Self::Markdown(_) => MessageKind::Markdown,
        }
    }
}

impl std::fmt::Debug for MessageBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(body) => f.debug_tuple("Text").field(body).finish(),
            Self::Image(bytes) => write!(f, "Image({} bytes)", bytes.len()),
            Self::Markdown(body) => f.debug_tuple("Markdown").field(body).finish(),
        }
    }
}

/// A request from either inbound channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub body: MessageBody,
    /// Recipient override; `None` or blank falls back to the configured default.
    pub recipient: Option<String>,
}

impl NormalizedRequest {
    pub fn new(body: MessageBody) -> Self {
        Self {
            body,
            recipient: None,
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::new(MessageBody::Text(body.into()))
    }

    pub fn image(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(MessageBody::Image(bytes.into()))
    }

    pub fn markdown(body: impl Into<String>) -> Self {
        Self::new(MessageBody::Markdown(body.into()))
    }

    /// Set the recipient override
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// Build a request from a kind tag and string content.
    ///
    /// Image content is base64 (standard alphabet, padded). Empty content is
    /// rejected for every kind.
    pub fn from_tagged(
        kind: MessageKind,
        content: &str,
        recipient: Option<String>,
    ) -> Result<Self, PayloadError> {
        if content.is_empty() {
            return Err(PayloadError::MissingField(kind.as_str()));
        }

        let body = match kind {
            MessageKind::Text => MessageBody::Text(content.to_string()),
            MessageKind::Markdown => MessageBody::Markdown(content.to_string()),
            MessageKind::Image => MessageBody::Image(decode_image(content)?),
        };

        Ok(Self { body, recipient })
    }

    pub fn kind(&self) -> MessageKind {
        self.body.kind()
    }

    /// The recipient override, if one was given and is not blank.
    pub fn recipient_override(&self) -> Option<&str> {
        self.recipient
            .as_deref()
            .filter(|recipient| !recipient.trim().is_empty())
    }
}

fn decode_image(content: &str) -> Result<Vec<u8>, PayloadError> {
    STANDARD
        .decode(content.trim())
        .map_err(|err| PayloadError::InvalidBase64(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_parse() {
        assert_eq!("text".parse::<MessageKind>().unwrap(), MessageKind::Text);
        assert_eq!("image".parse::<MessageKind>().unwrap(), MessageKind::Image);
        assert_eq!(
            "markdown".parse::<MessageKind>().unwrap(),
            MessageKind::Markdown
        );
        assert_eq!(
            "voice".parse::<MessageKind>(),
            Err(PayloadError::UnknownKind("voice".to_string()))
        );
    }

    #[test]
    fn test_message_kind_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&MessageKind::Markdown).unwrap(),
            "\"markdown\""
        );
        assert!(serde_json::from_str::<MessageKind>("\"Text\"").is_err());
    }

    #[test]
    fn test_from_tagged_decodes_image() {
        let request =
            NormalizedRequest::from_tagged(MessageKind::Image, "aGVsbG8=", None).unwrap();
        assert_eq!(request.body, MessageBody::Image(b"hello".to_vec()));
        assert_eq!(request.kind(), MessageKind::Image);
    }

    #[test]
    fn test_from_tagged_rejects_bad_base64() {
        let err = NormalizedRequest::from_tagged(MessageKind::Image, "not base64!", None)
            .unwrap_err();
        assert!(matches!(err, PayloadError::InvalidBase64(_)));
    }

    #[test]
    fn test_from_tagged_rejects_empty_content() {
        let err = NormalizedRequest::from_tagged(MessageKind::Text, "", None).unwrap_err();
        assert_eq!(err, PayloadError::MissingField("text"));
    }

    #[test]
    fn test_recipient_override_ignores_blank() {
        assert_eq!(NormalizedRequest::text("hi").recipient_override(), None);
        assert_eq!(
            NormalizedRequest::text("hi")
                .with_recipient("")
                .recipient_override(),
            None
        );
        assert_eq!(
            NormalizedRequest::text("hi")
                .with_recipient("  ")
                .recipient_override(),
            None
        );
        assert_eq!(
            NormalizedRequest::text("hi")
                .with_recipient("lisi|wangwu")
                .recipient_override(),
            Some("lisi|wangwu")
        );
    }

    #[test]
    fn test_image_debug_hides_bytes() {
        let body = MessageBody::Image(vec![0; 2048]);
        assert_eq!(format!("{:?}", body), "Image(2048 bytes)");
    }
}

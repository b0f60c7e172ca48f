//! Error types for credential exchange and message dispatch

use thiserror::Error;

use crate::wire::SendReceipt;

/// Failure to obtain an access credential from the issuer.
///
/// Never cached: the next `acquire` call performs a fresh exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// The issuer answered with a non-zero `errcode`.
    #[error("token exchange rejected (errcode {code}): {message}")]
    Rejected { code: i64, message: String },

    /// The issuer could not be reached or its response could not be decoded.
    #[error("token exchange failed: {0}")]
    Transport(String),
}

/// Failure of a single dispatch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    /// The outbound endpoint answered with a non-zero `errcode`.
    ///
    /// `receipt` is present when the rejection came from the send phase and
    /// carries the invalid user/party/tag lists reported by the endpoint.
    #[error("remote rejected request (errcode {code}): {message}")]
    RemoteRejection {
        code: i64,
        message: String,
        receipt: Option<SendReceipt>,
    },

    /// Network or decode failure before an application status was obtained.
    #[error("transport failure: {cause}")]
    Transport { cause: String },
}

impl DispatchError {
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport {
            cause: cause.to_string(),
        }
    }

    /// Short label used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth_failure",
            Self::RemoteRejection { .. } => "remote_rejection",
            Self::Transport { .. } => "transport_failure",
        }
    }
}

/// Inbound payload that cannot be turned into a normalized request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("unknown message type: {0}")]
    UnknownKind(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("failed to decode base64 image: {0}")]
    InvalidBase64(String),
}

/// Outcome of a dispatch: the decoded send receipt, or a classified failure.
pub type DispatchResult = std::result::Result<SendReceipt, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_converts_into_dispatch_error() {
        let err: DispatchError = AuthFailure::Rejected {
            code: 40013,
            message: "invalid corpid".to_string(),
        }
        .into();

        assert_eq!(err.kind(), "auth_failure");
        assert_eq!(
            err.to_string(),
            "token exchange rejected (errcode 40013): invalid corpid"
        );
    }

    #[test]
    fn test_rejection_display_carries_code_and_message() {
        let err = DispatchError::RemoteRejection {
            code: 81013,
            message: "user & party & tag all invalid".to_string(),
            receipt: None,
        };

        assert_eq!(err.kind(), "remote_rejection");
        assert!(err.to_string().contains("81013"));
        assert!(err.to_string().contains("user & party & tag all invalid"));
    }
}

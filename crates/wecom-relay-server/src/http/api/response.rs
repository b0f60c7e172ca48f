use serde::Serialize;
use wecom_relay_core::SendReceipt;

/// Body returned by the send endpoints.
#[derive(Serialize, Debug)]
pub struct SendResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<SendReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendResponse {
    pub fn delivered(receipt: SendReceipt) -> Self {
        Self {
            success: true,
            response: Some(receipt),
            error: None,
        }
    }

    /// Remote rejection. Upload-phase rejections have no send receipt, so one
    /// is synthesized from the code and message.
    pub fn rejected(code: i64, message: String, receipt: Option<SendReceipt>) -> Self {
        let receipt = receipt.unwrap_or_else(|| SendReceipt {
            errcode: code,
            errmsg: message.clone(),
            invaliduser: String::new(),
            invalidparty: String::new(),
            invalidtag: String::new(),
        });

        Self {
            success: false,
            response: Some(receipt),
            error: Some(message),
        }
    }
}

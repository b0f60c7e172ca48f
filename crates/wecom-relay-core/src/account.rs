//! Outbound account configuration

/// Public WeCom API host.
pub const DEFAULT_API_BASE: &str = "https://qyapi.weixin.qq.com";
/// Recipient used when a request carries no override.
pub const DEFAULT_RECIPIENT: &str = "@all";

/// Immutable per-process account context.
///
/// Built once at startup and shared by `Arc` between the credential cache and
/// the message sender. The [`Debug`] impl redacts the secret.
#[derive(Clone)]
pub struct AccountContext {
    /// Issuer identity (corp ID)
    pub corp_id: String,
    /// Issuer secret (application secret)
    pub secret: String,
    /// Numeric application identifier
    pub agent_id: i64,
    /// Default recipient list, e.g. `@all` or `user1|user2`
    pub default_recipient: String,
    /// Base URL of the outbound API, without trailing slash
    pub api_base: String,
}

impl AccountContext {
    pub fn new(corp_id: impl Into<String>, secret: impl Into<String>, agent_id: i64) -> Self {
        Self {
            corp_id: corp_id.into(),
            secret: secret.into(),
            agent_id,
            default_recipient: DEFAULT_RECIPIENT.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Set default recipient
    pub fn with_default_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.default_recipient = recipient.into();
        self
    }

    /// Point the account at a different API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Full URL for an API path such as `/cgi-bin/gettoken`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }
}

impl std::fmt::Debug for AccountContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountContext")
            .field("corp_id", &self.corp_id)
            .field("secret", &"[REDACTED]")
            .field("agent_id", &self.agent_id)
            .field("default_recipient", &self.default_recipient)
            .field("api_base", &self.api_base)
            .finish()
    }
}

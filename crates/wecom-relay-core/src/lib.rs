//! WeCom Relay Core
//!
//! Credential cache and dispatch gateway for relaying notifications to the
//! WeCom application-message API.
//!
//! # Architecture
//!
//! ```text
//!   HTTP adapter        MQTT adapter
//!        │                   │
//!        └───────┬───────────┘
//!                ▼  NormalizedRequest
//! ┌─────────────────────────────────────────┐
//! │            DispatchGateway              │
//! │  - resolves recipient                   │
//! │  - acquires credential, then sends      │
//! └─────────────────────────────────────────┘
//!        │                       │
//!        ▼                       ▼
//! CredentialCache          WeComSender
//! (gettoken, cached)       (media/upload, message/send)
//!        ▲
//!        └── BackgroundRefresher (hourly)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use wecom_relay_core::{AccountContext, CredentialCache, DispatchGateway, NormalizedRequest, WeComSender};
//!
//! let account = Arc::new(AccountContext::new(corp_id, secret, agent_id));
//! let client = reqwest::Client::new();
//! let cache = Arc::new(CredentialCache::new(account.clone(), client.clone()));
//! let sender = Arc::new(WeComSender::new(account.clone(), client));
//! let gateway = DispatchGateway::new(account, cache, sender);
//!
//! gateway.handle(NormalizedRequest::text("Build finished")).await?;
//! ```

pub mod account;
pub mod credential;
pub mod error;
pub mod gateway;
pub mod message;
pub mod refresher;
pub mod sender;
pub mod wire;

pub use account::AccountContext;
pub use credential::{Credential, CredentialCache, CredentialSource};
pub use error::{AuthFailure, DispatchError, DispatchResult, PayloadError};
pub use gateway::DispatchGateway;
pub use message::{MessageBody, MessageKind, NormalizedRequest};
pub use refresher::BackgroundRefresher;
pub use sender::{MessageSender, WeComSender};
pub use wire::SendReceipt;

//! Chat-completion provider abstraction for switchboard.
//!
//! The orchestration loop only sees [`ChatProvider`]: hand it a conversation
//! snapshot plus the tool descriptors and get back a [`ProviderReply`]. The
//! HTTP implementation for OpenAI-compatible endpoints (OpenRouter by
//! default) lives in [`client`].

mod client;

pub use client::OpenRouterClient;

use std::time::Duration;
use thiserror::Error;

use crate::message::{Message, ToolCallRequest};
use crate::schema::ToolDescriptor;

/// What the provider decided for this round-trip.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderReply {
    /// The provider wants capabilities invoked before it answers.
    ToolCalls {
        /// Text that accompanied the request, usually absent.
        content: Option<String>,
        calls: Vec<ToolCallRequest>,
    },
    /// A final natural-language answer.
    Final(String),
}

/// A failure talking to the provider. Always aborts the current turn.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to provider failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider reported an error: {0}")]
    Api(String),
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("provider did not respond within {0:?}")]
    Timeout(Duration),
}

/// The network boundary: one conversation snapshot in, one decision out.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    /// Model identifier, for display and logging.
    fn model(&self) -> &str;

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<ProviderReply, ProviderError>;
}

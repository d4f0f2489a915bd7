//! Seam between the relay and the generative-model vendor.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("provider response contained no text")]
    EmptyResponse,

    #[error("provider blocked the response ({0})")]
    Blocked(String),
}

/// One piece of a generation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Part {
    Text(String),
    /// Base64 payload tagged with its media type.
    InlineData { mime_type: String, data: String },
}

impl Part {
    pub fn is_inline_data(&self) -> bool {
        matches!(self, Part::InlineData { .. })
    }
}

#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Run one synchronous generation against `model` and return its text.
    async fn generate(&self, model: &str, parts: &[Part]) -> Result<String, ProviderError>;
}

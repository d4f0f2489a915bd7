//! Offline provider used by tests and by `CHAT_PROVIDER=echo`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::provider::{GenerativeProvider, Part, ProviderError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub model: String,
    pub parts: Vec<Part>,
}

/// Replies with the text parts of the request joined by newlines.
///
/// Only a provider built with [`EchoProvider::recording`] keeps its calls;
/// the server runs one that keeps nothing between requests.
#[derive(Clone, Debug, Default)]
pub struct EchoProvider {
    calls: Option<Arc<Mutex<Vec<RecordedCall>>>>,
    fail: bool,
}

impl EchoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// An echo provider that remembers every call for inspection.
    pub fn recording() -> Self {
        Self {
            calls: Some(Arc::new(Mutex::new(Vec::new()))),
            fail: false,
        }
    }

    /// A provider whose every call fails with an API error.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .as_ref()
            .and_then(|c| c.lock().ok().map(|c| c.clone()))
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeProvider for EchoProvider {
    async fn generate(&self, model: &str, parts: &[Part]) -> Result<String, ProviderError> {
        if let Some(Ok(mut calls)) = self.calls.as_ref().map(|c| c.lock()) {
            calls.push(RecordedCall { model: model.to_string(), parts: parts.to_vec() });
        }

        if self.fail {
            return Err(ProviderError::Api {
                status: 503,
                body: "echo provider configured to fail".to_string(),
            });
        }

        let text = parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(text)
    }
}

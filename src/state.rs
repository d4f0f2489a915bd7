// src/state.rs
use std::sync::Arc;

use crate::config::{Config, ProviderKind};
use crate::services::gemini::GeminiProvider;
use crate::services::mock::EchoProvider;
use crate::services::provider::{GenerativeProvider, ProviderError};
use crate::services::relay::Models;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub provider: Arc<dyn GenerativeProvider>,
    pub models: Models,
}

impl AppState {
    pub fn new(provider: Arc<dyn GenerativeProvider>, models: Models) -> Self {
        Self { provider, models }
    }

    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let provider: Arc<dyn GenerativeProvider> = match config.provider {
            ProviderKind::Gemini => Arc::new(GeminiProvider::new(
                config.api_base.clone(),
                config.api_key.clone().unwrap_or_default(),
                config.timeout,
            )?),
            ProviderKind::Echo => Arc::new(EchoProvider::new()),
        };

        Ok(Self::new(provider, config.models.clone()))
    }
}

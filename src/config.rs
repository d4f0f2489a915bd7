// src/config.rs
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::services::gemini::DEFAULT_API_BASE;
use crate::services::relay::Models;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-pro";
pub const DEFAULT_VISION_MODEL: &str = "gemini-pro-vision";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Echo,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub api_base: String,
    pub models: Models,
    pub timeout: Option<Duration>,
    pub max_upload_bytes: usize,
    pub public_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = parse_or("BIND_ADDR", get("BIND_ADDR"), DEFAULT_BIND_ADDR.parse().ok())?;

        let provider = match get("CHAT_PROVIDER").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("gemini") => ProviderKind::Gemini,
            Some("echo") => ProviderKind::Echo,
            Some(other) => {
                return Err(ConfigError::Invalid { key: "CHAT_PROVIDER", value: other.to_string() });
            }
        };

        let api_key = get("GOOGLE_API_KEY");
        if provider == ProviderKind::Gemini && api_key.is_none() {
            return Err(ConfigError::Missing("GOOGLE_API_KEY"));
        }

        let timeout = match get("GEMINI_TIMEOUT_SECS") {
            Some(v) => Some(Duration::from_secs(parse_or("GEMINI_TIMEOUT_SECS", Some(v), None)?)),
            None => None,
        };

        Ok(Self {
            bind_addr,
            provider,
            api_key,
            api_base: get("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            models: Models {
                text: get("GEMINI_TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
                vision: get("GEMINI_VISION_MODEL").unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
            },
            timeout,
            max_upload_bytes: parse_or(
                "MAX_UPLOAD_BYTES",
                get("MAX_UPLOAD_BYTES"),
                Some(DEFAULT_MAX_UPLOAD_BYTES),
            )?,
            public_dir: get("PUBLIC_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("public")),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: Option<T>,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => default.ok_or(ConfigError::Missing(key)),
    }
}

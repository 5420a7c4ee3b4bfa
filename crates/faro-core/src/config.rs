//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const DEFAULT_SIGNING_SECRET: &str = "faro-dev-secret";

/// Tunables for webhook delivery and notification batching.
///
/// All fields have defaults so the engine can be constructed without any
/// environment set up; `from_env` overrides them from the recognized
/// variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Key used to sign payloads for subscriptions without their own secret.
    pub signing_secret: String,
    /// Delivery attempts per subscription before a dispatch is terminal.
    pub max_retries: u32,
    /// Base backoff in seconds; attempt N waits `retry_delay_secs * N`.
    pub retry_delay_secs: u64,
    /// Per-attempt HTTP timeout in seconds.
    pub request_timeout_secs: u64,
    /// Aggregate endpoint for batched notifications; `None` disables
    /// forwarding.
    pub sink_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            signing_secret: DEFAULT_SIGNING_SECRET.to_string(),
            max_retries: 3,
            retry_delay_secs: 5,
            request_timeout_secs: 30,
            sink_url: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the environment.
    ///
    /// Recognized variables: `WEBHOOK_SECRET`, `WEBHOOK_MAX_RETRIES`,
    /// `WEBHOOK_RETRY_DELAY`, `WEBHOOK_TIMEOUT`, `NOTIFICATION_SINK_URL`.
    /// Malformed numeric values keep the default rather than failing the
    /// host process.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(secret) = std::env::var("WEBHOOK_SECRET") {
            if !secret.is_empty() {
                config.signing_secret = secret;
            }
        }

        config.max_retries = env_parse("WEBHOOK_MAX_RETRIES", config.max_retries);
        config.retry_delay_secs = env_parse("WEBHOOK_RETRY_DELAY", config.retry_delay_secs);
        config.request_timeout_secs = env_parse("WEBHOOK_TIMEOUT", config.request_timeout_secs);
        config.sink_url = std::env::var("NOTIFICATION_SINK_URL")
            .ok()
            .filter(|url| !url.is_empty());

        config
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid value {:?} for {}, using default {}", raw, key, default);
                default
            }
        },
        Err(_) => default,
    }
}

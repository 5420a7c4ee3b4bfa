//! Fan-out of one event to all matching subscriptions.

use crate::delivery::{deliver_once, DeliveryOutcome};
use crate::registry::{Subscription, WebhookRegistry};
use faro_core::{EngineConfig, EventKind};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Terminal result of dispatching one event to one subscription.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    pub subscription_id: String,
    pub success: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    /// Attempts actually used, including the final one.
    pub attempts: u32,
}

/// Orchestrates retrying deliveries across the subscriptions of an event.
///
/// Each subscription is handled by its own tokio task so a slow or
/// unreachable subscriber cannot delay delivery to the others.
pub struct WebhookDispatcher {
    registry: Arc<WebhookRegistry>,
    client: reqwest::Client,
    config: Arc<EngineConfig>,
}

impl WebhookDispatcher {
    pub fn new(
        registry: Arc<WebhookRegistry>,
        client: reqwest::Client,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            registry,
            client,
            config,
        }
    }

    /// Deliver `payload` to every enabled subscription of `event`,
    /// optionally narrowed to a single subscription id.
    ///
    /// Disabled subscriptions are skipped and do not appear in the result.
    /// An event with no matching subscriptions yields an empty vec; that is
    /// a normal outcome, not an error.
    pub async fn dispatch(
        &self,
        event: EventKind,
        payload: Value,
        subscription_id: Option<&str>,
    ) -> Vec<DeliveryResult> {
        let targets: Vec<Subscription> = self
            .registry
            .list_for_event(event)
            .await
            .into_iter()
            .filter(|subscription| subscription_id.map_or(true, |id| subscription.id == id))
            .filter(|subscription| subscription.enabled)
            .collect();

        if targets.is_empty() {
            debug!("No enabled webhooks for event {}", event);
            return Vec::new();
        }

        let mut handles = Vec::with_capacity(targets.len());
        for subscription in targets {
            let registry = self.registry.clone();
            let client = self.client.clone();
            let config = self.config.clone();
            let payload = payload.clone();
            handles.push(tokio::spawn(async move {
                Self::deliver_with_retry(&registry, &client, &config, subscription, payload).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for outcome in futures::future::join_all(handles).await {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => error!("Webhook delivery task failed to complete: {}", e),
            }
        }
        results
    }

    /// Retry loop for one subscription: up to `max_retries` attempts with a
    /// linear backoff (`retry_delay * attempt`, 1-indexed) between failures.
    /// The registry records the terminal outcome exactly once.
    async fn deliver_with_retry(
        registry: &WebhookRegistry,
        client: &reqwest::Client,
        config: &EngineConfig,
        subscription: Subscription,
        payload: Value,
    ) -> DeliveryResult {
        let max_attempts = config.max_retries.max(1);
        let mut attempts = 0;
        let mut last = DeliveryOutcome {
            success: false,
            status_code: None,
            error: None,
        };

        for attempt in 1..=max_attempts {
            attempts = attempt;
            last = deliver_once(
                client,
                &subscription,
                &payload,
                &config.signing_secret,
                config.request_timeout(),
            )
            .await;

            if last.success {
                break;
            }

            if attempt < max_attempts {
                warn!(
                    "Webhook {} delivery attempt {}/{} to {} failed: {}",
                    subscription.id,
                    attempt,
                    max_attempts,
                    subscription.url,
                    last.error.as_deref().unwrap_or("unknown error")
                );
                tokio::time::sleep(config.retry_delay() * attempt).await;
            } else {
                error!(
                    "Webhook {} delivery to {} failed after {} attempts: {}",
                    subscription.id,
                    subscription.url,
                    attempts,
                    last.error.as_deref().unwrap_or("unknown error")
                );
            }
        }

        registry.record_outcome(&subscription.id, last.success).await;

        DeliveryResult {
            subscription_id: subscription.id,
            success: last.success,
            status_code: last.status_code,
            error: last.error,
            attempts,
        }
    }
}

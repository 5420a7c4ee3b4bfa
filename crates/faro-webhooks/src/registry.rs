//! In-memory webhook subscription registry.

use chrono::{DateTime, Utc};
use faro_core::EventKind;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown event kind: {0}")]
    InvalidEventKind(String),
}

/// A registered webhook subscription.
///
/// Owned exclusively by the registry; callers operate on clones. Counters
/// are incremented once per completed dispatch, not per retry.
#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: String,
    pub event: EventKind,
    pub url: String,
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    /// Ordered extra headers; merged at delivery time, never overriding the
    /// standard set.
    pub extra_headers: Vec<(String, String)>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub success_count: u64,
    pub failure_count: u64,
}

/// Request to register a new subscription
#[derive(Debug, Clone)]
pub struct CreateSubscriptionRequest {
    /// Event name, e.g. `payment.approved`; validated against the catalog.
    pub event: String,
    pub url: String,
    /// Signing key for this subscription; the engine default is used when
    /// absent.
    pub secret: Option<String>,
    pub extra_headers: Vec<(String, String)>,
    pub enabled: bool,
}

impl CreateSubscriptionRequest {
    pub fn new(event: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            url: url.into(),
            secret: None,
            extra_headers: Vec::new(),
            enabled: true,
        }
    }
}

/// Aggregate registry report
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total_subscriptions: usize,
    pub enabled_subscriptions: usize,
    /// Subscription count per event name.
    pub events: HashMap<String, usize>,
    pub subscriptions: Vec<SubscriptionStats>,
}

/// Per-subscription counters as exposed in stats reports
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStats {
    pub id: String,
    pub event: EventKind,
    pub url: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub success_count: u64,
    pub failure_count: u64,
}

impl From<&Subscription> for SubscriptionStats {
    fn from(subscription: &Subscription) -> Self {
        Self {
            id: subscription.id.clone(),
            event: subscription.event,
            url: subscription.url.clone(),
            enabled: subscription.enabled,
            created_at: subscription.created_at,
            last_triggered_at: subscription.last_triggered_at,
            success_count: subscription.success_count,
            failure_count: subscription.failure_count,
        }
    }
}

/// In-memory catalog of subscriptions keyed by event kind.
///
/// Safe under concurrent dispatch tasks: all mutation happens behind a
/// single write lock, held only for the duration of an append, removal, or
/// counter update. Subscriptions live as long as the process; there is no
/// persistence layer.
#[derive(Default)]
pub struct WebhookRegistry {
    subscriptions: RwLock<HashMap<EventKind, Vec<Subscription>>>,
}

impl WebhookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription, returning its generated id.
    pub async fn register(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<String, RegistryError> {
        let event = EventKind::parse(&request.event)
            .ok_or_else(|| RegistryError::InvalidEventKind(request.event.clone()))?;

        let subscription = Subscription {
            id: uuid::Uuid::new_v4().to_string(),
            event,
            url: request.url,
            secret: request.secret,
            extra_headers: request.extra_headers,
            enabled: request.enabled,
            created_at: Utc::now(),
            last_triggered_at: None,
            success_count: 0,
            failure_count: 0,
        };
        let id = subscription.id.clone();

        let mut subscriptions = self.subscriptions.write().await;
        subscriptions.entry(event).or_default().push(subscription);
        info!("Registered webhook {} for event {}", id, event);
        Ok(id)
    }

    /// Remove a subscription. Idempotent: returns `false` for unknown ids.
    pub async fn unregister(&self, subscription_id: &str) -> bool {
        let mut subscriptions = self.subscriptions.write().await;
        let mut removed = false;
        for bucket in subscriptions.values_mut() {
            let before = bucket.len();
            bucket.retain(|subscription| subscription.id != subscription_id);
            removed |= bucket.len() < before;
        }
        if removed {
            info!("Unregistered webhook {}", subscription_id);
        } else {
            debug!("Unregister for unknown webhook {}", subscription_id);
        }
        removed
    }

    /// All subscriptions for an event, enabled and disabled.
    pub async fn list_for_event(&self, event: EventKind) -> Vec<Subscription> {
        let subscriptions = self.subscriptions.read().await;
        subscriptions.get(&event).cloned().unwrap_or_default()
    }

    /// Record the terminal outcome of a dispatch to one subscription.
    ///
    /// A no-op when the subscription was removed while its delivery was in
    /// flight.
    pub async fn record_outcome(&self, subscription_id: &str, success: bool) {
        let mut subscriptions = self.subscriptions.write().await;
        for bucket in subscriptions.values_mut() {
            if let Some(subscription) = bucket
                .iter_mut()
                .find(|subscription| subscription.id == subscription_id)
            {
                subscription.last_triggered_at = Some(Utc::now());
                if success {
                    subscription.success_count += 1;
                } else {
                    subscription.failure_count += 1;
                }
                return;
            }
        }
        debug!(
            "Outcome for webhook {} dropped, subscription no longer registered",
            subscription_id
        );
    }

    /// Aggregate report over the registry, with the per-subscription list
    /// optionally narrowed to one id.
    pub async fn stats(&self, subscription_id: Option<&str>) -> RegistryStats {
        let subscriptions = self.subscriptions.read().await;
        let mut stats = RegistryStats {
            total_subscriptions: 0,
            enabled_subscriptions: 0,
            events: HashMap::new(),
            subscriptions: Vec::new(),
        };

        for (event, bucket) in subscriptions.iter() {
            stats.events.insert(event.as_str().to_string(), bucket.len());
            stats.total_subscriptions += bucket.len();
            stats.enabled_subscriptions +=
                bucket.iter().filter(|subscription| subscription.enabled).count();

            for subscription in bucket {
                if let Some(id) = subscription_id {
                    if subscription.id != id {
                        continue;
                    }
                }
                stats.subscriptions.push(SubscriptionStats::from(subscription));
            }
        }

        stats
    }
}

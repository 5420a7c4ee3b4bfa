//! The event router: one façade over the webhook and notification halves.

use crate::payloads::{
    BlogPostLikedPayload, CreditsLowPayload, PaymentPayload, UserRegisteredPayload,
};
use chrono::Utc;
use faro_core::{EngineConfig, EventKind, Notification, NotificationKind};
use faro_notifications::{BatchConsumer, NotificationQueue};
use faro_webhooks::{
    CreateSubscriptionRequest, DeliveryResult, RegistryError, RegistryStats, WebhookDispatcher,
    WebhookRegistry, DELIVERY_USER_AGENT,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Router errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Event engine is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to encode event payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// The single entry point external collaborators hold.
///
/// Constructed once at process startup and passed by handle; there is no
/// global instance. `start` launches the notification batch consumer and
/// `stop` shuts the engine down cooperatively, letting the in-flight batch
/// drain and refusing new work afterwards.
pub struct EventRouter {
    config: Arc<EngineConfig>,
    registry: Arc<WebhookRegistry>,
    dispatcher: WebhookDispatcher,
    queue: NotificationQueue,
    consumer: BatchConsumer,
    shutting_down: AtomicBool,
}

impl EventRouter {
    pub fn new(config: EngineConfig) -> Self {
        let config = Arc::new(config);
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(DELIVERY_USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        let registry = Arc::new(WebhookRegistry::new());
        let dispatcher = WebhookDispatcher::new(registry.clone(), client.clone(), config.clone());
        let (queue, receiver) = NotificationQueue::create_channel();
        let consumer = BatchConsumer::new(receiver, client, config.clone());

        Self {
            config,
            registry,
            dispatcher,
            queue,
            consumer,
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Construct from the recognized environment variables.
    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start the background notification consumer.
    pub async fn start(&self) {
        self.consumer.start().await;
        info!("Event router started");
    }

    /// Stop the engine: refuse new publishes, then drain the consumer.
    pub async fn stop(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.consumer.stop().await;
        info!("Event router stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.consumer.is_running().await
    }

    /// Fan `payload` out to every enabled subscription of `event`.
    pub async fn publish(
        &self,
        event: EventKind,
        payload: Value,
    ) -> Result<Vec<DeliveryResult>, EngineError> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(EngineError::ShuttingDown);
        }
        Ok(self.dispatcher.dispatch(event, payload, None).await)
    }

    /// Deliver to a single subscription only, e.g. for manual redelivery.
    pub async fn publish_to(
        &self,
        event: EventKind,
        payload: Value,
        subscription_id: &str,
    ) -> Result<Vec<DeliveryResult>, EngineError> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(EngineError::ShuttingDown);
        }
        Ok(self
            .dispatcher
            .dispatch(event, payload, Some(subscription_id))
            .await)
    }

    /// Queue a local notification; never blocks on the consumer.
    pub fn notify(
        &self,
        user_id: impl Into<String>,
        kind: NotificationKind,
        data: Value,
    ) -> Result<(), EngineError> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(EngineError::ShuttingDown);
        }
        self.queue
            .enqueue(Notification::new(user_id, kind, data))
            .map_err(|_| EngineError::ShuttingDown)
    }

    pub async fn register_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<String, EngineError> {
        Ok(self.registry.register(request).await?)
    }

    /// Idempotent; returns whether anything was removed.
    pub async fn unregister_subscription(&self, subscription_id: &str) -> bool {
        self.registry.unregister(subscription_id).await
    }

    pub async fn stats(&self, subscription_id: Option<&str>) -> RegistryStats {
        self.registry.stats(subscription_id).await
    }

    // ------------------------------------------------------------------
    // Typed publish helpers for the events the platform emits itself.
    // ------------------------------------------------------------------

    pub async fn publish_user_registered(
        &self,
        payload: UserRegisteredPayload,
    ) -> Result<Vec<DeliveryResult>, EngineError> {
        let value = serde_json::to_value(&payload)?;
        self.publish(EventKind::UserRegistered, value).await
    }

    pub async fn publish_payment(
        &self,
        payload: PaymentPayload,
    ) -> Result<Vec<DeliveryResult>, EngineError> {
        let event = payload.status.event();
        let value = serde_json::to_value(&payload)?;
        self.publish(event, value).await
    }

    pub async fn publish_blog_post_liked(
        &self,
        payload: BlogPostLikedPayload,
    ) -> Result<Vec<DeliveryResult>, EngineError> {
        let value = serde_json::to_value(&payload)?;
        self.publish(EventKind::BlogPostLiked, value).await
    }

    pub async fn publish_credits_low(
        &self,
        payload: CreditsLowPayload,
    ) -> Result<Vec<DeliveryResult>, EngineError> {
        let value = serde_json::to_value(&payload)?;
        self.publish(EventKind::CreditsLow, value).await
    }

    // ------------------------------------------------------------------
    // Typed notify helpers for the local notifications the platform emits.
    // ------------------------------------------------------------------

    pub fn notify_credit_purchase(
        &self,
        user_id: &str,
        credits: i64,
        status: &str,
    ) -> Result<(), EngineError> {
        self.notify(
            user_id,
            NotificationKind::CreditPurchaseApproved,
            json!({"credits": credits, "status": status, "currency": "ARS"}),
        )
    }

    pub fn notify_profile_updated(
        &self,
        user_id: &str,
        fields_updated: &[&str],
    ) -> Result<(), EngineError> {
        self.notify(
            user_id,
            NotificationKind::ProfileUpdated,
            json!({"fields_updated": fields_updated, "updated_at": Utc::now()}),
        )
    }

    pub fn notify_avatar_updated(&self, user_id: &str, avatar_type: &str) -> Result<(), EngineError> {
        self.notify(
            user_id,
            NotificationKind::AvatarUpdated,
            json!({"avatar_type": avatar_type, "updated_at": Utc::now()}),
        )
    }

    pub fn notify_privacy_updated(
        &self,
        user_id: &str,
        settings_updated: &[&str],
    ) -> Result<(), EngineError> {
        self.notify(
            user_id,
            NotificationKind::PrivacyUpdated,
            json!({"settings_updated": settings_updated, "updated_at": Utc::now()}),
        )
    }

    pub fn notify_payment_failed(&self, user_id: &str, reason: &str) -> Result<(), EngineError> {
        self.notify(
            user_id,
            NotificationKind::PaymentFailed,
            json!({"reason": reason, "failed_at": Utc::now()}),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_router() -> EventRouter {
        EventRouter::new(EngineConfig {
            signing_secret: "test-secret".to_string(),
            max_retries: 1,
            retry_delay_secs: 0,
            request_timeout_secs: 1,
            sink_url: None,
        })
    }

    #[tokio::test]
    async fn test_publish_without_subscriptions_is_silent() {
        let router = test_router();
        let results = router
            .publish(EventKind::SystemMaintenance, json!({"window": "02:00"}))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_event() {
        let router = test_router();
        let result = router
            .register_subscription(CreateSubscriptionRequest::new(
                "not.a.real.event",
                "https://example.test/hook",
            ))
            .await;
        assert!(matches!(
            result,
            Err(EngineError::Registry(RegistryError::InvalidEventKind(_)))
        ));
    }

    #[tokio::test]
    async fn test_stop_refuses_publish_and_notify() {
        let router = test_router();
        router.start().await;
        router.stop().await;

        let publish = router.publish(EventKind::UserRegistered, json!({})).await;
        assert!(matches!(publish, Err(EngineError::ShuttingDown)));

        let notify = router.notify("user-1", NotificationKind::ProfileUpdated, json!({}));
        assert!(matches!(notify, Err(EngineError::ShuttingDown)));
    }

    #[tokio::test]
    async fn test_unregister_via_router_is_idempotent() {
        let router = test_router();
        let id = router
            .register_subscription(CreateSubscriptionRequest::new(
                "blog.post_created",
                "https://example.test/hook",
            ))
            .await
            .unwrap();
        assert!(router.unregister_subscription(&id).await);
        assert!(!router.unregister_subscription(&id).await);
    }

    #[tokio::test]
    async fn test_notify_helpers_queue_without_consumer() {
        let router = test_router();
        // The consumer has not started; queueing must still succeed.
        router.notify_credit_purchase("user-1", 100, "approved").unwrap();
        router.notify_profile_updated("user-1", &["alias"]).unwrap();
        router.notify_avatar_updated("user-1", "generated").unwrap();
        router.notify_privacy_updated("user-1", &["visibility"]).unwrap();
        router.notify_payment_failed("user-1", "card declined").unwrap();
    }
}

//! # faro-webhooks
//!
//! Signed webhook delivery for Faro platform events.
//!
//! This crate provides functionality for:
//! - Registering subscriptions against the fixed event catalog
//! - Delivering signed payloads to subscriber URLs
//! - Retry logic with linear backoff, isolated per subscription
//! - Per-subscription delivery statistics

mod delivery;
mod dispatcher;
mod registry;
mod signer;

pub use delivery::{deliver_once, DeliveryEnvelope, DeliveryOutcome, DELIVERY_USER_AGENT};
pub use dispatcher::{DeliveryResult, WebhookDispatcher};
pub use registry::{
    CreateSubscriptionRequest, RegistryError, RegistryStats, Subscription, SubscriptionStats,
    WebhookRegistry,
};
pub use signer::sign_payload;

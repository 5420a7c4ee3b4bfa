//! # faro-events
//!
//! The public surface of the Faro event fabric.
//!
//! External collaborators construct one [`EventRouter`] at process startup
//! and use it to publish webhook events, queue local notifications, and
//! manage subscriptions. Everything else in the engine is reachable only
//! through it.

mod payloads;
mod router;

pub use payloads::{
    BlogPostLikedPayload, CreditsLowPayload, PaymentPayload, PaymentStatus, UserRegisteredPayload,
};
pub use router::{EngineError, EventRouter};

// Re-export the types callers need alongside the router.
pub use faro_core::{EngineConfig, EventKind, Notification, NotificationKind};
pub use faro_webhooks::{
    CreateSubscriptionRequest, DeliveryResult, RegistryError, RegistryStats, SubscriptionStats,
};

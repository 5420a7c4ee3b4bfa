//! # faro-notifications
//!
//! Local notification queue and batch consumer.
//!
//! Notifications are enqueued without blocking the caller, drained in
//! bounded batches, optionally forwarded to an aggregate sink endpoint,
//! and routed to per-type local handlers.

mod consumer;
mod handlers;
mod queue;

pub use consumer::{BatchConsumer, MAX_BATCH_SIZE};
pub use handlers::dispatch_local;
pub use queue::{NotificationQueue, NotificationReceiver, QueueError};

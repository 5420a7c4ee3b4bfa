//! Core types shared across all Faro crates

pub mod config;
pub mod events;
pub mod notification;

pub use config::EngineConfig;
pub use events::EventKind;
pub use notification::{Notification, NotificationKind};

// Re-export external dependencies
pub use chrono;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tracing;
pub use uuid;

//! Typed payloads for the events the platform emits itself.
//!
//! Callers can always publish a raw `serde_json::Value`; these structs
//! exist so the common emitters (registration, payments, blog activity,
//! credit alerts) agree on field names.

use chrono::{DateTime, Utc};
use faro_core::EventKind;
use serde::{Deserialize, Serialize};

/// Outcome of a payment, selecting the event the dispatch goes out under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Approved,
    Failed,
}

impl PaymentStatus {
    pub fn event(self) -> EventKind {
        match self {
            Self::Approved => EventKind::PaymentApproved,
            Self::Failed => EventKind::PaymentFailed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRegisteredPayload {
    pub user_id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub alias: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub payment_id: String,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    /// Credits granted by this payment, if it was a credit purchase.
    pub credits: Option<i64>,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPostLikedPayload {
    pub post_id: String,
    pub post_title: String,
    pub liker_id: String,
    pub liker_alias: Option<String>,
    pub author_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditsLowPayload {
    pub user_id: String,
    pub email: String,
    pub alias: Option<String>,
    pub credits: i64,
    pub alert_threshold: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_maps_to_event() {
        assert_eq!(PaymentStatus::Approved.event(), EventKind::PaymentApproved);
        assert_eq!(PaymentStatus::Failed.event(), EventKind::PaymentFailed);
    }

    #[test]
    fn test_payment_payload_serialization() {
        let payload = PaymentPayload {
            payment_id: "pay-9".to_string(),
            user_id: "user-1".to_string(),
            amount: 1500.0,
            currency: "ARS".to_string(),
            credits: Some(100),
            status: PaymentStatus::Approved,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["status"], "approved");
        assert_eq!(value["credits"], 100);
    }
}

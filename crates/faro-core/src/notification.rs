//! Local notification types consumed by the batch processor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The known local notification types, plus an escape hatch for callers
/// that emit their own.
///
/// Local dispatch matches on this enum; `Other` notifications are logged
/// and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    CreditPurchaseApproved,
    ProfileUpdated,
    AvatarUpdated,
    PrivacyUpdated,
    PaymentFailed,
    Other(String),
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreditPurchaseApproved => "credit_purchase_approved",
            Self::ProfileUpdated => "profile_updated",
            Self::AvatarUpdated => "avatar_updated",
            Self::PrivacyUpdated => "privacy_updated",
            Self::PaymentFailed => "payment_failed",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for NotificationKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "credit_purchase_approved" => Self::CreditPurchaseApproved,
            "profile_updated" => Self::ProfileUpdated,
            "avatar_updated" => Self::AvatarUpdated,
            "privacy_updated" => Self::PrivacyUpdated,
            "payment_failed" => Self::PaymentFailed,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for NotificationKind {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A queued local notification.
///
/// Transient: owned by the queue until the batch consumer picks it up.
/// There is no redelivery if the process dies mid-batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub data: Value,
    #[serde(rename = "timestamp")]
    pub enqueued_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: impl Into<String>, kind: NotificationKind, data: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            kind,
            data,
            enqueued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_roundtrip() {
        let kind: NotificationKind = "profile_updated".to_string().into();
        assert_eq!(kind, NotificationKind::ProfileUpdated);
        assert_eq!(String::from(kind), "profile_updated");
    }

    #[test]
    fn test_unknown_kind_is_preserved() {
        let kind: NotificationKind = "something_custom".to_string().into();
        assert_eq!(kind, NotificationKind::Other("something_custom".into()));
        assert_eq!(kind.as_str(), "something_custom");
    }

    #[test]
    fn test_notification_wire_shape() {
        let notification = Notification::new(
            "user-42",
            NotificationKind::CreditPurchaseApproved,
            json!({"credits": 100, "status": "approved", "currency": "ARS"}),
        );
        let value = serde_json::to_value(&notification).unwrap();

        assert_eq!(value["user_id"], "user-42");
        assert_eq!(value["type"], "credit_purchase_approved");
        assert_eq!(value["data"]["credits"], 100);
        assert!(value["timestamp"].is_string());
    }
}

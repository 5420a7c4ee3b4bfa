//! The closed catalog of business events that can carry webhook subscriptions.

use serde::{Deserialize, Serialize};

/// All business events subscribers can listen to.
///
/// The catalog is closed: registering a subscription for any name outside
/// this set is rejected synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    // User lifecycle
    #[serde(rename = "user.registered")]
    UserRegistered,
    #[serde(rename = "user.profile_completed")]
    UserProfileCompleted,

    // Payments
    #[serde(rename = "payment.approved")]
    PaymentApproved,
    #[serde(rename = "payment.failed")]
    PaymentFailed,

    // Blog activity
    #[serde(rename = "blog.post_created")]
    BlogPostCreated,
    #[serde(rename = "blog.post_liked")]
    BlogPostLiked,

    // Platform
    #[serde(rename = "credits.low")]
    CreditsLow,
    #[serde(rename = "system.maintenance")]
    SystemMaintenance,
    #[serde(rename = "security.alert")]
    SecurityAlert,
}

impl EventKind {
    /// Returns all available event kinds
    pub fn all() -> Vec<Self> {
        vec![
            Self::UserRegistered,
            Self::UserProfileCompleted,
            Self::PaymentApproved,
            Self::PaymentFailed,
            Self::BlogPostCreated,
            Self::BlogPostLiked,
            Self::CreditsLow,
            Self::SystemMaintenance,
            Self::SecurityAlert,
        ]
    }

    /// Returns the wire name of the event kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRegistered => "user.registered",
            Self::UserProfileCompleted => "user.profile_completed",
            Self::PaymentApproved => "payment.approved",
            Self::PaymentFailed => "payment.failed",
            Self::BlogPostCreated => "blog.post_created",
            Self::BlogPostLiked => "blog.post_liked",
            Self::CreditsLow => "credits.low",
            Self::SystemMaintenance => "system.maintenance",
            Self::SecurityAlert => "security.alert",
        }
    }

    /// Parse an event kind from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user.registered" => Some(Self::UserRegistered),
            "user.profile_completed" => Some(Self::UserProfileCompleted),
            "payment.approved" => Some(Self::PaymentApproved),
            "payment.failed" => Some(Self::PaymentFailed),
            "blog.post_created" => Some(Self::BlogPostCreated),
            "blog.post_liked" => Some(Self::BlogPostLiked),
            "credits.low" => Some(Self::CreditsLow),
            "system.maintenance" => Some(Self::SystemMaintenance),
            "security.alert" => Some(Self::SecurityAlert),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_serialization() {
        let kind = EventKind::PaymentApproved;
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, "\"payment.approved\"");
    }

    #[test]
    fn test_event_kind_parse() {
        assert_eq!(
            EventKind::parse("user.registered"),
            Some(EventKind::UserRegistered)
        );
        assert_eq!(EventKind::parse("not.a.real.event"), None);
        assert_eq!(EventKind::parse(""), None);
    }

    #[test]
    fn test_event_kind_roundtrip() {
        for kind in EventKind::all() {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_event_kind_display() {
        assert_eq!(EventKind::CreditsLow.to_string(), "credits.low");
    }
}

//! Local side effects for consumed notifications.

use faro_core::{Notification, NotificationKind};
use serde_json::Value;
use tracing::{info, warn};

fn str_field<'a>(data: &'a Value, key: &str, default: &'a str) -> &'a str {
    data.get(key).and_then(Value::as_str).unwrap_or(default)
}

/// Route one notification to the handler for its type.
///
/// Unknown types are logged and dropped; a handler failure is reported to
/// the caller but must never take down the consumer loop.
pub fn dispatch_local(notification: &Notification) -> anyhow::Result<()> {
    let user_id = &notification.user_id;
    let data = &notification.data;

    match &notification.kind {
        NotificationKind::CreditPurchaseApproved => {
            let credits = data.get("credits").and_then(Value::as_i64).unwrap_or(0);
            info!(
                "Credit purchase approved for user {}: {} credits",
                user_id, credits
            );
        }
        NotificationKind::ProfileUpdated => {
            info!("Profile updated for user {}", user_id);
        }
        NotificationKind::AvatarUpdated => {
            info!(
                "Avatar updated for user {} ({})",
                user_id,
                str_field(data, "avatar_type", "unknown")
            );
        }
        NotificationKind::PrivacyUpdated => {
            info!("Privacy settings updated for user {}", user_id);
        }
        NotificationKind::PaymentFailed => {
            warn!(
                "Payment failed for user {}: {}",
                user_id,
                str_field(data, "reason", "unknown")
            );
        }
        NotificationKind::Other(kind) => {
            warn!(
                "Unknown notification type {} for user {}, dropping",
                kind, user_id
            );
        }
    }

    Ok(())
}

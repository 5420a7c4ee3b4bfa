//! Single delivery attempts against a subscriber endpoint.

use crate::registry::Subscription;
use crate::signer::sign_payload;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// User agent sent on every delivery.
pub const DELIVERY_USER_AGENT: &str = "Faro-Events/1.0";

/// Header names owned by the engine; extra headers never replace these.
const STANDARD_HEADERS: &[&str] = &[
    "content-type",
    "user-agent",
    "x-webhook-event",
    "x-webhook-id",
    "x-timestamp",
    "x-signature",
];

/// The wire body posted to subscribers and signed via [`sign_payload`].
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryEnvelope {
    pub event: String,
    pub webhook_id: String,
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}

/// Classified result of one HTTP POST.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub success: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    fn failed(status_code: Option<u16>, error: String) -> Self {
        Self {
            success: false,
            status_code,
            error: Some(error),
        }
    }
}

/// Perform exactly one delivery attempt.
///
/// Builds the envelope and standard headers, signs the canonicalized
/// envelope with the subscription secret (or the engine default), merges
/// the subscription's extra headers, and issues a single POST bounded by
/// `timeout`. Status 200/201/202 counts as success; anything else, or a
/// transport error, is a failure. Retry policy lives one layer up.
pub async fn deliver_once(
    client: &reqwest::Client,
    subscription: &Subscription,
    data: &Value,
    default_secret: &str,
    timeout: Duration,
) -> DeliveryOutcome {
    let now = Utc::now();
    let envelope = DeliveryEnvelope {
        event: subscription.event.as_str().to_string(),
        webhook_id: subscription.id.clone(),
        timestamp: now,
        data: data.clone(),
    };
    let body = match serde_json::to_value(&envelope) {
        Ok(body) => body,
        Err(e) => return DeliveryOutcome::failed(None, format!("payload encoding failed: {e}")),
    };

    let secret = subscription.secret.as_deref().unwrap_or(default_secret);
    let signature = sign_payload(&body, secret);

    let mut request = client
        .post(&subscription.url)
        .timeout(timeout)
        .header("Content-Type", "application/json")
        .header("User-Agent", DELIVERY_USER_AGENT)
        .header("X-Webhook-Event", subscription.event.as_str())
        .header("X-Webhook-ID", &subscription.id)
        .header("X-Timestamp", now.timestamp().to_string())
        .header("X-Signature", &signature);

    for (name, value) in &subscription.extra_headers {
        if STANDARD_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
            debug!(
                "Skipping extra header {} for webhook {}, standard headers are not overridable",
                name, subscription.id
            );
            continue;
        }
        request = request.header(name.as_str(), value.as_str());
    }

    match request.json(&body).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            if matches!(status, 200 | 201 | 202) {
                debug!(
                    "Webhook {} delivered to {} (status {})",
                    subscription.id, subscription.url, status
                );
                DeliveryOutcome {
                    success: true,
                    status_code: Some(status),
                    error: None,
                }
            } else {
                DeliveryOutcome::failed(Some(status), format!("unexpected status {status}"))
            }
        }
        Err(e) => DeliveryOutcome::failed(e.status().map(|s| s.as_u16()), e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use faro_core::EventKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn subscription(url: String) -> Subscription {
        Subscription {
            id: "sub-1".to_string(),
            event: EventKind::PaymentApproved,
            url,
            secret: None,
            extra_headers: Vec::new(),
            enabled: true,
            created_at: Utc::now(),
            last_triggered_at: None,
            success_count: 0,
            failure_count: 0,
        }
    }

    #[tokio::test]
    async fn test_successful_delivery_sends_standard_headers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("Content-Type", "application/json"))
            .and(header("User-Agent", DELIVERY_USER_AGENT))
            .and(header("X-Webhook-Event", "payment.approved"))
            .and(header("X-Webhook-ID", "sub-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let target = subscription(format!("{}/hook", mock_server.uri()));
        let outcome = deliver_once(
            &client,
            &target,
            &json!({"amount": 100}),
            "default-secret",
            Duration::from_secs(5),
        )
        .await;

        assert!(outcome.success);
        assert_eq!(outcome.status_code, Some(200));
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_accepted_statuses_count_as_success() {
        for status in [201u16, 202] {
            let mock_server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&mock_server)
                .await;

            let client = reqwest::Client::new();
            let target = subscription(format!("{}/hook", mock_server.uri()));
            let outcome = deliver_once(
                &client,
                &target,
                &json!({}),
                "secret",
                Duration::from_secs(5),
            )
            .await;
            assert!(outcome.success, "status {status} should be success");
            assert_eq!(outcome.status_code, Some(status));
        }
    }

    #[tokio::test]
    async fn test_non_2xx_is_failure_with_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let target = subscription(format!("{}/hook", mock_server.uri()));
        let outcome = deliver_once(
            &client,
            &target,
            &json!({}),
            "secret",
            Duration::from_secs(5),
        )
        .await;

        assert!(!outcome.success);
        assert_eq!(outcome.status_code, Some(503));
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_timeout_is_failure_without_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let target = subscription(format!("{}/hook", mock_server.uri()));
        let outcome = deliver_once(
            &client,
            &target,
            &json!({}),
            "secret",
            Duration::from_millis(50),
        )
        .await;

        assert!(!outcome.success);
        assert_eq!(outcome.status_code, None);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_extra_headers_merge_without_overriding_standard() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("X-Custom", "custom-value"))
            .and(header("User-Agent", DELIVERY_USER_AGENT))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let mut target = subscription(format!("{}/hook", mock_server.uri()));
        target.extra_headers = vec![
            ("X-Custom".to_string(), "custom-value".to_string()),
            ("User-Agent".to_string(), "Imposter/9.9".to_string()),
        ];

        let outcome = deliver_once(
            &client,
            &target,
            &json!({}),
            "secret",
            Duration::from_secs(5),
        )
        .await;
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn test_body_signature_verifies() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let mut target = subscription(format!("{}/hook", mock_server.uri()));
        target.secret = Some("subscriber-secret".to_string());

        let outcome = deliver_once(
            &client,
            &target,
            &json!({"amount": 100, "currency": "ARS"}),
            "default-secret",
            Duration::from_secs(5),
        )
        .await;
        assert!(outcome.success);

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let received: Value = serde_json::from_slice(&requests[0].body).unwrap();

        assert_eq!(received["event"], "payment.approved");
        assert_eq!(received["webhook_id"], "sub-1");
        assert_eq!(received["data"]["amount"], 100);
        assert_eq!(received["data"]["currency"], "ARS");
        assert!(received["timestamp"].is_string());

        // The signature is over the canonicalized body, keyed with the
        // subscription secret rather than the engine default.
        let signature = requests[0]
            .headers
            .get("X-Signature")
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(signature, sign_payload(&received, "subscriber-secret"));
    }
}
